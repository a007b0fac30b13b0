use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use spg_common::MinorUnits;

/// Which party absorbs Paystack's processing fee on a split payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bearer {
    /// The main (platform) account.
    Account,
    /// The merchant's subaccount.
    Subaccount,
}

/// Request body for `POST /transaction/initialize`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InitializeTransaction {
    pub email: String,
    /// Amount in the currency's subunit (kobo for NGN).
    pub amount: MinorUnits,
    pub currency: String,
    pub reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subaccount: Option<String>,
    /// Flat amount (in subunits) that stays in the main account when `subaccount` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_charge: Option<MinorUnits>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearer: Option<Bearer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl InitializeTransaction {
    pub fn new<S: Into<String>>(email: S, amount: MinorUnits, currency: S, reference: S) -> Self {
        Self {
            email: email.into(),
            amount,
            currency: currency.into(),
            reference: reference.into(),
            callback_url: None,
            subaccount: None,
            transaction_charge: None,
            bearer: None,
            metadata: None,
        }
    }

    pub fn with_callback_url(mut self, url: String) -> Self {
        self.callback_url = Some(url);
        self
    }

    pub fn with_split(mut self, subaccount: String, transaction_charge: MinorUnits, bearer: Bearer) -> Self {
        self.subaccount = Some(subaccount);
        self.transaction_charge = Some(transaction_charge);
        self.bearer = Some(bearer);
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// `data` field of a successful `POST /transaction/initialize` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionAuthorization {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Success,
    Failed,
    Abandoned,
    Ongoing,
    Pending,
    Processing,
    Queued,
    Reversed,
}

impl TransactionStatus {
    /// Once a transaction reaches one of these states Paystack will not change it again.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::Abandoned | Self::Reversed)
    }
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Abandoned => "abandoned",
            Self::Ongoing => "ongoing",
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Queued => "queued",
            Self::Reversed => "reversed",
        };
        f.write_str(s)
    }
}

/// `data` field of `GET /transaction/verify/:reference`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionVerification {
    pub reference: String,
    pub status: TransactionStatus,
    pub amount: MinorUnits,
    pub currency: String,
    pub customer: Customer,
    #[serde(default)]
    pub paid_at: Option<String>,
    #[serde(default)]
    pub gateway_response: Option<String>,
}

/// Every Paystack response is wrapped in this envelope. `data` is absent on most failures.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiResponse<T> {
    pub status: bool,
    pub message: String,
    pub data: Option<T>,
}
