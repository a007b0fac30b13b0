use spg_common::MinorUnits;
use thiserror::Error;

use crate::{
    db_types::{OrderReference, PaymentStatus},
    traits::{ProviderError, StoreError},
};

#[derive(Debug, Clone, Error)]
pub enum CheckoutError {
    #[error("Invalid checkout request: {0}")]
    Validation(String),
    #[error("Merchant {0} does not exist")]
    MerchantNotFound(i64),
    #[error("The store for merchant {0} is not accepting orders")]
    StoreInactive(i64),
    #[error("{0}")]
    DatabaseError(#[from] StoreError),
}

#[derive(Debug, Clone, Error)]
pub enum PaymentInitiationError {
    #[error("Invalid payment request: {0}")]
    Validation(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderReference),
    #[error("Order {reference} is {status}, so no new payment can be started for it")]
    NotPending { reference: OrderReference, status: PaymentStatus },
    #[error("Requested amount {provided} does not match the order total {expected}")]
    AmountMismatch { expected: MinorUnits, provided: MinorUnits },
    #[error("Merchant {0} does not exist")]
    MerchantNotFound(i64),
    #[error("{0}")]
    Provider(#[from] ProviderError),
    #[error("{0}")]
    DatabaseError(#[from] StoreError),
}

/// Settlement only fails when the outcome could not be determined. Everything else (duplicates, unknown references,
/// mismatched amounts) is a successful outcome.
#[derive(Debug, Clone, Error)]
pub enum SettlementError {
    #[error("Settlement could not be completed, please retry. {0}")]
    Transient(#[from] StoreError),
}
