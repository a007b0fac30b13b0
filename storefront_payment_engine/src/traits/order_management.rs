use chrono::{DateTime, Utc};
use log::*;

use crate::{
    db_types::{NewOrder, Order, OrderReference, PaymentStatus},
    traits::{StoreError, TransitionOutcome},
};

/// How many fresh references `insert_order` tries before giving up.
pub const MAX_REFERENCE_ATTEMPTS: usize = 3;

/// Persistence of orders.
///
/// Payment status is monotonic: `pending -> completed` or `pending -> failed`, and nothing else. Backends enforce
/// this with a single conditional write so that concurrent settlements of the same order cannot both win.
#[allow(async_fn_in_trait)]
pub trait OrderManagement: Clone {
    /// Stores the order under the given reference. A unique-constraint clash on the reference must be reported as
    /// [`StoreError::ReferenceCollision`] so that [`Self::insert_order`] can retry.
    async fn insert_order_with_reference(
        &self,
        reference: &OrderReference,
        order: &NewOrder,
    ) -> Result<Order, StoreError>;

    /// Assigns a fresh `PREFIX-<millis>-<RANDOM6>` reference and stores the order with `payment_status = pending`.
    ///
    /// On a reference collision a new random suffix is drawn, up to [`MAX_REFERENCE_ATTEMPTS`] times.
    async fn insert_order(&self, order: NewOrder, prefix: &str) -> Result<Order, StoreError> {
        for attempt in 1..=MAX_REFERENCE_ATTEMPTS {
            let reference = OrderReference::generate(prefix);
            match self.insert_order_with_reference(&reference, &order).await {
                Err(StoreError::ReferenceCollision(r)) => {
                    warn!("🗃️ Order reference {r} collided (attempt {attempt}/{MAX_REFERENCE_ATTEMPTS})");
                },
                result => return result,
            }
        }
        Err(StoreError::DuplicateReference(MAX_REFERENCE_ATTEMPTS))
    }

    async fn fetch_order_by_reference(&self, reference: &OrderReference) -> Result<Option<Order>, StoreError>;

    /// Moves a pending order to `new_status` (which must be terminal) and stamps `payment_date`.
    ///
    /// * `Applied` if this call performed the transition,
    /// * `Unchanged` if the order was already completed or failed. `payment_date` is left untouched,
    /// * `StoreError::OrderNotFound` if no order has this reference.
    async fn transition_payment_status(
        &self,
        reference: &OrderReference,
        new_status: PaymentStatus,
        payment_date: DateTime<Utc>,
    ) -> Result<TransitionOutcome, StoreError>;
}
