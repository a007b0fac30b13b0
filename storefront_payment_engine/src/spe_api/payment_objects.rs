use std::{fmt::Display, str::FromStr, time::Duration};

use log::*;
use serde::{Deserialize, Serialize};
use spg_common::MinorUnits;

use crate::{
    db_types::{Merchant, Order, OrderReference},
    traits::{FeeBearer, SplitInstruction},
};

pub const DEFAULT_MERCHANT_SHARE_PERCENT: u8 = 95;
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(15);

/// How a payment is divided between the platform and the merchant's subaccount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitPolicy {
    /// The platform keeps the processor and platform fees embedded in each order line and bears the provider's fee.
    /// The merchant receives the sum of the line prices. Orders whose lines carry no fee snapshot fall back to a
    /// percentage split with `fallback_share`.
    FeeCharge { fallback_share: u8 },
    /// The merchant receives this percentage of the charged amount.
    Percentage(u8),
}

impl Default for SplitPolicy {
    fn default() -> Self {
        Self::FeeCharge { fallback_share: DEFAULT_MERCHANT_SHARE_PERCENT }
    }
}

impl Display for SplitPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FeeCharge { fallback_share } => write!(f, "fee_charge (fallback {fallback_share}%)"),
            Self::Percentage(share) => write!(f, "percentage ({share}%)"),
        }
    }
}

impl SplitPolicy {
    /// Parses `fee_charge` or `percentage`, using `share` as the merchant percentage.
    pub fn from_mode(mode: &str, share: u8) -> Result<Self, String> {
        let share = share.min(100);
        match mode.trim().to_ascii_lowercase().as_str() {
            "fee_charge" | "fee-charge" => Ok(Self::FeeCharge { fallback_share: share }),
            "percentage" => Ok(Self::Percentage(share)),
            s => Err(format!("Unknown split mode '{s}'. Use 'fee_charge' or 'percentage'")),
        }
    }

    /// The split for `order`, or `None` if the merchant has no subaccount to pay into.
    pub fn instruction_for(&self, order: &Order, merchant: &Merchant) -> Option<SplitInstruction> {
        let subaccount = merchant.subaccount_code.as_deref().map(str::trim).filter(|s| !s.is_empty())?.to_string();
        let total = order.total_amount;
        let transaction_charge = match *self {
            Self::Percentage(share) => platform_share(total, share),
            Self::FeeCharge { fallback_share } => match order.line_items() {
                Ok(lines) if !lines.is_empty() => {
                    let fees = lines.iter().try_fold(MinorUnits::default(), |acc, l| acc.checked_add(l.line_fees()?));
                    match fees {
                        Some(fees) => fees.min(total).max(MinorUnits::default()),
                        None => {
                            warn!(
                                "💳️ Order {} has a malformed fee snapshot. Using a percentage split",
                                order.order_reference
                            );
                            platform_share(total, fallback_share)
                        },
                    }
                },
                Ok(_) => platform_share(total, fallback_share),
                Err(e) => {
                    debug!("💳️ Order {} has no usable fee snapshot ({e}). Using a percentage split", order.order_reference);
                    platform_share(total, fallback_share)
                },
            },
        };
        Some(SplitInstruction { subaccount, transaction_charge, bearer: FeeBearer::Account })
    }
}

impl FromStr for SplitPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_mode(s, DEFAULT_MERCHANT_SHARE_PERCENT)
    }
}

fn platform_share(total: MinorUnits, merchant_share: u8) -> MinorUnits {
    let platform_percent = 100 - u32::from(merchant_share.min(100));
    total.basis_points(platform_percent * 100)
}

#[derive(Debug, Clone)]
pub struct PaymentConfig {
    /// Where the provider sends the customer after the hosted checkout
    pub callback_url: Option<String>,
    pub split_policy: SplitPolicy,
    pub provider_timeout: Duration,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self { callback_url: None, split_policy: SplitPolicy::default(), provider_timeout: DEFAULT_PROVIDER_TIMEOUT }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    pub reference: OrderReference,
    pub email: String,
    pub amount: MinorUnits,
    pub admin_id: i64,
    pub customer_name: String,
    pub customer_phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSession {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
    /// WhatsApp deep link to the merchant, if they have a usable phone number
    pub redirect_url: Option<String>,
}
