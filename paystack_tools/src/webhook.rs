use serde::{Deserialize, Serialize};
use serde_json::Value;
use spg_common::MinorUnits;

use crate::{data_objects::Customer, PaystackApiError};

/// Header carrying the HMAC-SHA512 signature of the raw webhook body.
pub const PAYSTACK_SIGNATURE_HEADER: &str = "x-paystack-signature";

/// The part of a `charge.*` event's `data` object the settlement pipeline relies on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeData {
    pub reference: String,
    pub amount: MinorUnits,
    pub currency: String,
    pub customer: Customer,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub paid_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaystackWebhookEvent {
    ChargeSuccess(ChargeData),
    ChargeFailed(ChargeData),
    /// Any other event name. Acknowledged and otherwise ignored.
    Unsupported(String),
}

#[derive(Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Value,
}

impl PaystackWebhookEvent {
    /// Decodes a webhook body. Unknown event names are not an error, but a known event whose `data` does not have
    /// the expected shape is.
    pub fn from_slice(body: &[u8]) -> Result<Self, PaystackApiError> {
        let envelope: Envelope =
            serde_json::from_slice(body).map_err(|e| PaystackApiError::MalformedWebhook(e.to_string()))?;
        let charge = |data: Value| {
            serde_json::from_value::<ChargeData>(data)
                .map_err(|e| PaystackApiError::MalformedWebhook(format!("{}: {e}", envelope.event)))
        };
        match envelope.event.as_str() {
            "charge.success" => Ok(Self::ChargeSuccess(charge(envelope.data)?)),
            "charge.failed" => Ok(Self::ChargeFailed(charge(envelope.data)?)),
            _ => Ok(Self::Unsupported(envelope.event)),
        }
    }

    pub fn event_name(&self) -> &str {
        match self {
            Self::ChargeSuccess(_) => "charge.success",
            Self::ChargeFailed(_) => "charge.failed",
            Self::Unsupported(name) => name.as_str(),
        }
    }
}
