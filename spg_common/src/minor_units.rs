use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
};

use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const DEFAULT_CURRENCY_CODE: &str = "NGN";
/// Every currency the storefront trades in has two decimal places (kobo, pesewas, cents).
pub const MINOR_UNITS_PER_MAJOR: i64 = 100;

//--------------------------------------     MinorUnits       ---------------------------------------------------------
/// An amount of money in the currency's smallest unit, e.g. kobo. This is also the unit the payment provider uses on
/// the wire, so no conversion is needed when talking to it.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct MinorUnits(i64);

op!(binary MinorUnits, Add, add);
op!(binary MinorUnits, Sub, sub);
op!(inplace MinorUnits, AddAssign, add_assign);
op!(inplace MinorUnits, SubAssign, sub_assign);
op!(unary MinorUnits, Neg, neg);

impl Sum for MinorUnits {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MinorUnitsConversionError {
    #[error("{0} has more than two decimal places")]
    TooPrecise(Decimal),
    #[error("{0} is too large to represent")]
    OutOfRange(Decimal),
}

impl From<i64> for MinorUnits {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for MinorUnits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_major())
    }
}

impl MinorUnits {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Converts a decimal amount in major units (e.g. `5000.00` naira) into minor units. The conversion is exact;
    /// sub-minor-unit precision is rejected rather than rounded away.
    pub fn from_major(amount: Decimal) -> Result<Self, MinorUnitsConversionError> {
        let scaled = amount
            .checked_mul(Decimal::from(MINOR_UNITS_PER_MAJOR))
            .ok_or(MinorUnitsConversionError::OutOfRange(amount))?;
        if !scaled.fract().is_zero() {
            return Err(MinorUnitsConversionError::TooPrecise(amount));
        }
        scaled.to_i64().map(Self).ok_or(MinorUnitsConversionError::OutOfRange(amount))
    }

    pub fn from_major_units(amount: i64) -> Self {
        Self(amount * MINOR_UNITS_PER_MAJOR)
    }

    pub fn to_major(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// `None` on overflow.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// `None` on overflow.
    pub fn checked_mul(self, rhs: i64) -> Option<Self> {
        self.0.checked_mul(rhs).map(Self)
    }

    /// Returns `bps` basis points (1/100th of a percent) of this amount, rounded half-up to the nearest minor unit.
    pub fn basis_points(&self, bps: u32) -> Self {
        let product = i128::from(self.0) * i128::from(bps);
        let rounded = (product + 5_000).div_euclid(10_000);
        Self(i64::try_from(rounded).unwrap_or(i64::MAX))
    }
}

/// Serde adapter for fields that are [`MinorUnits`] internally but travel as decimal major units (`5000.00`) in JSON.
///
/// ```rust,ignore
/// #[serde(with = "spg_common::major_units")]
/// pub total_amount: MinorUnits,
/// ```
pub mod major_units {
    use rust_decimal::{prelude::ToPrimitive, Decimal};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    use super::MinorUnits;

    pub fn serialize<S: Serializer>(value: &MinorUnits, serializer: S) -> Result<S::Ok, S::Error> {
        let major = value.to_major().to_f64().unwrap_or_default();
        serializer.serialize_f64(major)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<MinorUnits, D::Error> {
        let amount = <Decimal as Deserialize>::deserialize(deserializer)?;
        MinorUnits::from_major(amount).map_err(D::Error::custom)
    }
}
