use serde::{Deserialize, Serialize};
use serde_json::Value;
use spg_common::MinorUnits;
use thiserror::Error;

use crate::db_types::{OrderReference, PaymentEvent};

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("The payment provider rejected the request: {0}")]
    Rejected(String),
    #[error("The payment provider did not respond in time")]
    Timeout,
    #[error("Could not reach the payment provider: {0}")]
    Unavailable(String),
    #[error("The payment provider sent an unexpected response: {0}")]
    Malformed(String),
}

/// Which account absorbs the provider's processing fee on a split payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeBearer {
    /// The platform's main account
    Account,
    /// The merchant's subaccount
    Subaccount,
}

/// Routes part of a payment to a merchant subaccount. The platform keeps `transaction_charge`; the subaccount receives
/// the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitInstruction {
    pub subaccount: String,
    pub transaction_charge: MinorUnits,
    pub bearer: FeeBearer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InitializePayment {
    pub reference: OrderReference,
    pub email: String,
    pub amount: MinorUnits,
    pub currency: String,
    pub callback_url: Option<String>,
    pub split: Option<SplitInstruction>,
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAuthorization {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

#[allow(async_fn_in_trait)]
pub trait PaymentProvider {
    /// Creates a hosted-checkout transaction. Implementations must not retry.
    async fn initialize_transaction(&self, request: InitializePayment) -> Result<PaymentAuthorization, ProviderError>;

    /// Asks the provider for the authoritative state of the transaction. `None` means the transaction has not reached
    /// a final state yet.
    async fn verify_transaction(&self, reference: &OrderReference) -> Result<Option<PaymentEvent>, ProviderError>;
}
