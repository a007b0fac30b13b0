//! # Product pricing
//!
//! Every product carries a pricing snapshot computed once when it is saved:
//!
//! ```text
//!   processor_fee  = round(price * processor_rate) + processor_fixed_fee   (fixed part waived for small prices, capped)
//!   platform_fee   = round(price * platform_rate)
//!   adjusted_price = price + processor_fee + platform_fee
//! ```
//!
//! The customer is charged `adjusted_price`. Both fees are deductions from it, so the merchant is left with exactly
//! `price`. Rates are expressed in basis points and rounding is half-up on the minor unit.
use serde::{Deserialize, Serialize};
use spg_common::{major_units, MinorUnits};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Price must be greater than zero, but was {0}")]
pub struct InvalidPriceError(pub MinorUnits);

/// Fee parameters. The defaults follow Paystack's local card pricing (1.5% + NGN 100, the NGN 100 waived under
/// NGN 2,500, capped at NGN 2,000) and a 5% platform commission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSchedule {
    pub processor_rate_bps: u32,
    pub processor_fixed_fee: MinorUnits,
    pub fixed_fee_waiver_threshold: MinorUnits,
    pub processor_fee_cap: MinorUnits,
    pub platform_rate_bps: u32,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            processor_rate_bps: 150,
            processor_fixed_fee: MinorUnits::from_major_units(100),
            fixed_fee_waiver_threshold: MinorUnits::from_major_units(2_500),
            processor_fee_cap: MinorUnits::from_major_units(2_000),
            platform_rate_bps: 500,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    #[serde(with = "major_units")]
    pub price: MinorUnits,
    #[serde(with = "major_units")]
    pub paystack_fee: MinorUnits,
    #[serde(with = "major_units")]
    pub superadmin_fee: MinorUnits,
    #[serde(with = "major_units")]
    pub adjusted_price: MinorUnits,
}

impl FeeBreakdown {
    /// What the merchant is left with once both fees are taken out of the charged amount.
    pub fn merchant_share(&self) -> MinorUnits {
        self.adjusted_price - self.paystack_fee - self.superadmin_fee
    }
}

impl FeeSchedule {
    pub fn processor_fee(&self, price: MinorUnits) -> MinorUnits {
        let mut fee = price.basis_points(self.processor_rate_bps);
        if price >= self.fixed_fee_waiver_threshold {
            fee += self.processor_fixed_fee;
        }
        fee.min(self.processor_fee_cap)
    }

    pub fn platform_fee(&self, price: MinorUnits) -> MinorUnits {
        price.basis_points(self.platform_rate_bps)
    }

    pub fn calculate(&self, price: MinorUnits) -> Result<FeeBreakdown, InvalidPriceError> {
        if !price.is_positive() {
            return Err(InvalidPriceError(price));
        }
        let paystack_fee = self.processor_fee(price);
        let superadmin_fee = self.platform_fee(price);
        let adjusted_price = price + paystack_fee + superadmin_fee;
        Ok(FeeBreakdown { price, paystack_fee, superadmin_fee, adjusted_price })
    }
}
