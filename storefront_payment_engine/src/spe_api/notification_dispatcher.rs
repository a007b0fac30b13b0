use std::{fmt::Debug, time::Duration};

use log::*;
use serde_json::json;

use crate::{
    db_types::{NewAuditLogEntry, NewNotification, NotificationType, Order, PaymentEvent},
    spe_api::settlement_objects::{ChannelResult, DispatchReport, EventProvenance},
    traits::{MerchantManagement, NotificationManagement, PushError, PushMessage, PushNotifier},
};

pub const DEFAULT_PUSH_TIMEOUT: Duration = Duration::from_secs(5);
pub const ORDER_RESOURCE: &str = "order";

/// Fans a settlement out to the merchant over three independent channels: device push, an in-app notification row,
/// and the audit log.
///
/// Delivery is best-effort. A failure on one channel is logged and does not stop the others, and nothing already
/// written is rolled back.
pub struct NotificationDispatcher<B, P> {
    db: B,
    push: P,
    push_timeout: Duration,
}

impl<B, P> Debug for NotificationDispatcher<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NotificationDispatcher(push timeout: {:?})", self.push_timeout)
    }
}

struct Dispatch {
    recipient_id: i64,
    notification_type: NotificationType,
    title: String,
    message: String,
    audit: NewAuditLogEntry,
}

impl<B, P> NotificationDispatcher<B, P>
where
    B: MerchantManagement + NotificationManagement,
    P: PushNotifier,
{
    pub fn new(db: B, push: P) -> Self {
        Self { db, push, push_timeout: DEFAULT_PUSH_TIMEOUT }
    }

    pub fn with_push_timeout(mut self, timeout: Duration) -> Self {
        self.push_timeout = timeout;
        self
    }

    pub async fn order_paid(&self, order: &Order, provenance: &EventProvenance) -> DispatchReport {
        let message = format!(
            "Order {} from {} has been paid ({} {}).",
            order.order_reference, order.customer_name, order.currency, order.total_amount
        );
        let dispatch = Dispatch {
            recipient_id: order.admin_id,
            notification_type: NotificationType::OrderPaid,
            title: "New paid order".to_string(),
            message,
            audit: status_change_entry("payment.completed", order, provenance),
        };
        self.dispatch(dispatch).await
    }

    pub async fn order_failed(&self, order: &Order, provenance: &EventProvenance) -> DispatchReport {
        let message = format!("Payment for order {} from {} failed.", order.order_reference, order.customer_name);
        let dispatch = Dispatch {
            recipient_id: order.admin_id,
            notification_type: NotificationType::OrderFailed,
            title: "Payment failed".to_string(),
            message,
            audit: status_change_entry("payment.failed", order, provenance),
        };
        self.dispatch(dispatch).await
    }

    /// A success event whose amount or currency disagrees with the order. The order is not touched; the merchant
    /// and the audit log are told about the discrepancy.
    pub async fn payment_flagged(
        &self,
        order: &Order,
        event: &PaymentEvent,
        provenance: &EventProvenance,
    ) -> DispatchReport {
        let message = format!(
            "A payment of {} {} was reported for order {}, which totals {} {}. The order has not been marked as paid.",
            event.currency, event.amount, order.order_reference, order.currency, order.total_amount
        );
        let audit = NewAuditLogEntry {
            actor: provenance.actor.clone(),
            action: "payment.amount_mismatch".to_string(),
            resource_type: ORDER_RESOURCE.to_string(),
            resource_id: order.order_reference.to_string(),
            before_state: Some(json!({
                "payment_status": order.payment_status,
                "total_amount": order.total_amount.value(),
                "currency": order.currency,
            })),
            after_state: Some(json!({
                "payment_status": order.payment_status,
                "received_amount": event.amount.value(),
                "received_currency": event.currency,
                "customer_email": event.customer_email,
            })),
            ip_address: provenance.ip_address.clone(),
            user_agent: provenance.user_agent.clone(),
        };
        let dispatch = Dispatch {
            recipient_id: order.admin_id,
            notification_type: NotificationType::PaymentFlagged,
            title: "Payment needs review".to_string(),
            message,
            audit,
        };
        self.dispatch(dispatch).await
    }

    async fn dispatch(&self, dispatch: Dispatch) -> DispatchReport {
        let Dispatch { recipient_id, notification_type, title, message, audit } = dispatch;
        let push = self.push_to_devices(recipient_id, PushMessage::new(title, message.clone())).await;
        let notification = NewNotification { recipient_id, message, notification_type };
        let notification = match self.db.insert_notification(notification).await {
            Ok(n) => {
                trace!("📣️ Notification #{} stored for merchant #{recipient_id}", n.id);
                ChannelResult::Delivered
            },
            Err(e) => {
                error!("📣️ Could not store {notification_type} notification for merchant #{recipient_id}. {e}");
                ChannelResult::Failed(e.to_string())
            },
        };
        let action = audit.action.clone();
        let audit = match self.db.insert_audit_log(audit).await {
            Ok(entry) => {
                trace!("📣️ Audit log #{} written for {action}", entry.id);
                ChannelResult::Delivered
            },
            Err(e) => {
                error!("📣️ Could not write audit log entry for {action}. {e}");
                ChannelResult::Failed(e.to_string())
            },
        };
        let report = DispatchReport { push, notification, audit };
        debug!("📣️ {notification_type} fan-out for merchant #{recipient_id}: {report:?}");
        report
    }

    async fn push_to_devices(&self, recipient_id: i64, message: PushMessage) -> ChannelResult {
        let tokens = match self.db.fetch_device_tokens(recipient_id).await {
            Ok(t) if t.is_empty() => {
                debug!("📣️ Merchant #{recipient_id} has no registered devices. Skipping push");
                return ChannelResult::Skipped;
            },
            Ok(t) => t,
            Err(e) => {
                warn!("📣️ Could not fetch device tokens for merchant #{recipient_id}. {e}");
                return ChannelResult::Failed(e.to_string());
            },
        };
        let result = tokio::time::timeout(self.push_timeout, self.push.send(&tokens, &message))
            .await
            .unwrap_or(Err(PushError::Timeout));
        match result {
            Ok(()) => ChannelResult::Delivered,
            Err(e) => {
                warn!("📣️ Push to {} device(s) of merchant #{recipient_id} failed. {e}", tokens.len());
                ChannelResult::Failed(e.to_string())
            },
        }
    }
}

fn status_change_entry(action: &str, order: &Order, provenance: &EventProvenance) -> NewAuditLogEntry {
    NewAuditLogEntry {
        actor: provenance.actor.clone(),
        action: action.to_string(),
        resource_type: ORDER_RESOURCE.to_string(),
        resource_id: order.order_reference.to_string(),
        before_state: Some(json!({ "payment_status": "pending" })),
        after_state: Some(json!({
            "payment_status": order.payment_status,
            "payment_date": order.payment_date,
            "total_amount": order.total_amount.value(),
            "currency": order.currency,
        })),
        ip_address: provenance.ip_address.clone(),
        user_agent: provenance.user_agent.clone(),
    }
}
