use std::{fmt::Debug, time::Duration};

use chrono::Utc;
use log::*;

use crate::{
    db_types::{PaymentEvent, PaymentEventKind},
    spe_api::{
        errors::SettlementError,
        notification_dispatcher::NotificationDispatcher,
        settlement_objects::{EventProvenance, SettlementOutcome},
    },
    traits::{MerchantManagement, NotificationManagement, OrderManagement, PushNotifier, StoreError, TransitionOutcome},
};

/// `SettlementApi` applies provider payment events to orders.
///
/// Events may arrive more than once, out of order, or concurrently (a webhook racing a client-side verification).
/// Idempotence comes from the order row itself: the only write is the guarded `pending -> terminal` transition, and
/// notifications are only sent by the call that performed it.
pub struct SettlementApi<B, P> {
    db: B,
    dispatcher: NotificationDispatcher<B, P>,
}

impl<B, P> Debug for SettlementApi<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementApi")
    }
}

impl<B, P> SettlementApi<B, P>
where
    B: OrderManagement + MerchantManagement + NotificationManagement,
    P: PushNotifier,
{
    pub fn new(db: B, push: P) -> Self {
        let dispatcher = NotificationDispatcher::new(db.clone(), push);
        Self { db, dispatcher }
    }

    pub fn with_push_timeout(mut self, timeout: Duration) -> Self {
        self.dispatcher = self.dispatcher.with_push_timeout(timeout);
        self
    }

    /// Applies a payment event that has already been authenticated (verified webhook signature, or fetched from the
    /// provider's API).
    ///
    /// 1. Unknown reference: logged, nothing changes. An order that is already settled makes this a duplicate, whatever
    ///    the event says.
    /// 2. Success events must match the order's total and currency exactly. On a mismatch the order stays as it is
    ///    and the discrepancy is flagged to the merchant and the audit log.
    /// 3. The guarded transition. If the order was already settled, this is a duplicate and nothing else happens.
    /// 4. A fresh transition fans out `order_paid` or `order_failed` notifications.
    ///
    /// Failure events skip step 2; they credit nothing. The only error is a storage failure, which the caller should
    /// surface so the provider redelivers.
    pub async fn apply(
        &self,
        event: PaymentEvent,
        provenance: EventProvenance,
    ) -> Result<SettlementOutcome, SettlementError> {
        let reference = &event.reference;
        trace!("🧾️ Applying {:?} event for {reference} from {}", event.kind, provenance.actor);
        let Some(order) = self.db.fetch_order_by_reference(reference).await? else {
            warn!("🧾️ Received a {:?} event for unknown order {reference}. Ignoring it", event.kind);
            return Ok(SettlementOutcome::UnknownReference(reference.clone()));
        };
        if order.payment_status.is_terminal() {
            info!("🧾️ Order {reference} is already {}. Duplicate event ignored", order.payment_status);
            return Ok(SettlementOutcome::Duplicate(order));
        }
        if event.kind == PaymentEventKind::Success &&
            (event.amount != order.total_amount || !event.currency.eq_ignore_ascii_case(&order.currency))
        {
            warn!(
                "🧾️ Payment for order {reference} does not match. Expected {} {}, but received {} {}. The order has \
                 been flagged for review.",
                order.currency, order.total_amount, event.currency, event.amount
            );
            let report = self.dispatcher.payment_flagged(&order, &event, &provenance).await;
            trace!("🧾️ Flag report for {reference}: {report:?}");
            return Ok(SettlementOutcome::AmountMismatch {
                order,
                received: event.amount,
                received_currency: event.currency,
            });
        }
        let new_status = event.kind.target_status();
        let outcome = match self.db.transition_payment_status(reference, new_status, Utc::now()).await {
            Ok(outcome) => outcome,
            Err(StoreError::OrderNotFound(r)) => {
                warn!("🧾️ Order {r} disappeared during settlement. Ignoring the event");
                return Ok(SettlementOutcome::UnknownReference(r));
            },
            Err(e) => {
                error!("🧾️ Could not settle order {reference}. {e}");
                return Err(e.into());
            },
        };
        let order = match outcome {
            TransitionOutcome::Unchanged(order) => {
                info!("🧾️ Order {reference} is already {}. Duplicate event ignored", order.payment_status);
                return Ok(SettlementOutcome::Duplicate(order));
            },
            TransitionOutcome::Applied(order) => order,
        };
        info!("🧾️ Order {reference} is now {}", order.payment_status);
        let result = match event.kind {
            PaymentEventKind::Success => {
                let report = self.dispatcher.order_paid(&order, &provenance).await;
                trace!("🧾️ Paid fan-out for {reference}: {report:?}");
                SettlementOutcome::Settled(order)
            },
            PaymentEventKind::Failure => {
                let report = self.dispatcher.order_failed(&order, &provenance).await;
                trace!("🧾️ Failed fan-out for {reference}: {report:?}");
                SettlementOutcome::Failed(order)
            },
        };
        Ok(result)
    }
}
