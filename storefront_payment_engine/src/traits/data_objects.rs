use thiserror::Error;

use crate::db_types::{Order, OrderReference, PaymentStatus};

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("We have an internal database engine (configuration/uptime etc.) error: {0}")]
    DatabaseError(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderReference),
    #[error("The order reference {0} is already taken")]
    ReferenceCollision(OrderReference),
    #[error("Could not allocate a unique order reference after {0} attempts")]
    DuplicateReference(usize),
    #[error("Payments can only move to a terminal status, not {0}")]
    InvalidTransition(PaymentStatus),
    #[error("The requested merchant {0} does not exist")]
    MerchantNotFound(i64),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::DatabaseError(e.to_string())
    }
}

/// Result of the guarded `pending -> terminal` transition.
#[derive(Debug, Clone)]
pub enum TransitionOutcome {
    /// This call moved the order out of `pending`. The order is returned in its new state.
    Applied(Order),
    /// The order had already been settled. Nothing was written; the current row is returned.
    Unchanged(Order),
}

impl TransitionOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    pub fn order(&self) -> &Order {
        match self {
            Self::Applied(o) | Self::Unchanged(o) => o,
        }
    }

    pub fn into_order(self) -> Order {
        match self {
            Self::Applied(o) | Self::Unchanged(o) => o,
        }
    }
}
