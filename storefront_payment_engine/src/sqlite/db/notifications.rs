use log::trace;
use sqlx::SqliteConnection;

use crate::db_types::{AuditLogEntry, NewAuditLogEntry, NewNotification, Notification};

pub async fn insert_notification(
    notification: NewNotification,
    conn: &mut SqliteConnection,
) -> Result<Notification, sqlx::Error> {
    let result: Notification = sqlx::query_as(
        r#"
            INSERT INTO notifications (recipient_id, message, notification_type)
            VALUES ($1, $2, $3)
            RETURNING *;
        "#,
    )
    .bind(notification.recipient_id)
    .bind(notification.message)
    .bind(notification.notification_type)
    .fetch_one(conn)
    .await?;
    trace!("🗃️ Notification #{} ({}) stored for user #{}", result.id, result.notification_type, result.recipient_id);
    Ok(result)
}

pub async fn fetch_notifications_for(
    recipient_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Notification>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM notifications WHERE recipient_id = $1 ORDER BY id DESC")
        .bind(recipient_id)
        .fetch_all(conn)
        .await
}

pub async fn insert_audit_log(entry: NewAuditLogEntry, conn: &mut SqliteConnection) -> Result<AuditLogEntry, sqlx::Error> {
    let before = entry.before_state.map(|v| v.to_string());
    let after = entry.after_state.map(|v| v.to_string());
    let result: AuditLogEntry = sqlx::query_as(
        r#"
            INSERT INTO audit_logs (actor, action, resource_type, resource_id, before_state, after_state, ip_address, user_agent)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *;
        "#,
    )
    .bind(entry.actor)
    .bind(entry.action)
    .bind(entry.resource_type)
    .bind(entry.resource_id)
    .bind(before)
    .bind(after)
    .bind(entry.ip_address)
    .bind(entry.user_agent)
    .fetch_one(conn)
    .await?;
    trace!("🗃️ Audit log #{}: {} on {} {}", result.id, result.action, result.resource_type, result.resource_id);
    Ok(result)
}

pub async fn fetch_audit_logs_for(
    resource_type: &str,
    resource_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<AuditLogEntry>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM audit_logs WHERE resource_type = $1 AND resource_id = $2 ORDER BY id")
        .bind(resource_type)
        .bind(resource_id)
        .fetch_all(conn)
        .await
}
