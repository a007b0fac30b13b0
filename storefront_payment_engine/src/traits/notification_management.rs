use crate::{
    db_types::{AuditLogEntry, NewAuditLogEntry, NewNotification, Notification},
    traits::StoreError,
};

#[allow(async_fn_in_trait)]
pub trait NotificationManagement: Clone {
    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification, StoreError>;

    /// The audit log is append-only. There is no update or delete.
    async fn insert_audit_log(&self, entry: NewAuditLogEntry) -> Result<AuditLogEntry, StoreError>;

    /// Newest first.
    async fn fetch_notifications_for(&self, recipient_id: i64) -> Result<Vec<Notification>, StoreError>;

    /// Oldest first.
    async fn fetch_audit_logs_for(&self, resource_type: &str, resource_id: &str)
        -> Result<Vec<AuditLogEntry>, StoreError>;
}
