//! `SqliteDatabase` is a concrete implementation of a storefront payment engine backend.
//!
//! It implements all the persistence traits defined in the [`crate::traits`] module.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::{migrate::MigrateError, SqlitePool};
use thiserror::Error;

use super::db::{db_url, merchants, new_pool, notifications, orders};
use crate::{
    db_types::{
        AuditLogEntry,
        Merchant,
        NewAuditLogEntry,
        NewMerchant,
        NewNotification,
        NewOrder,
        Notification,
        Order,
        OrderReference,
        PaymentStatus,
    },
    traits::{MerchantManagement, NotificationManagement, OrderManagement, StoreError, TransitionOutcome},
};

#[derive(Debug, Error)]
pub enum SqliteDatabaseError {
    #[error("Database connection error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Could not apply database migrations: {0}")]
    MigrationError(#[from] MigrateError),
}

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order_with_reference(
        &self,
        reference: &OrderReference,
        order: &NewOrder,
    ) -> Result<Order, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::insert_order(reference, order, &mut conn).await?;
        debug!("🗃️ Order {} has been saved in the DB with id {}", order.order_reference, order.id);
        Ok(order)
    }

    async fn fetch_order_by_reference(&self, reference: &OrderReference) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_reference(reference, &mut conn).await?;
        Ok(order)
    }

    async fn transition_payment_status(
        &self,
        reference: &OrderReference,
        new_status: PaymentStatus,
        payment_date: DateTime<Utc>,
    ) -> Result<TransitionOutcome, StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::transition_payment_status(reference, new_status, payment_date, &mut conn).await
    }
}

impl MerchantManagement for SqliteDatabase {
    async fn fetch_merchant(&self, merchant_id: i64) -> Result<Option<Merchant>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let merchant = merchants::fetch_merchant(merchant_id, &mut conn).await?;
        Ok(merchant)
    }

    async fn fetch_device_tokens(&self, merchant_id: i64) -> Result<Vec<String>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let tokens = merchants::fetch_device_tokens(merchant_id, &mut conn).await?;
        Ok(tokens)
    }

    async fn insert_merchant(&self, merchant: NewMerchant) -> Result<Merchant, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let merchant = merchants::insert_merchant(merchant, &mut conn).await?;
        Ok(merchant)
    }

    async fn register_device_token(&self, merchant_id: i64, token: &str) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        if merchants::fetch_merchant(merchant_id, &mut tx).await?.is_none() {
            return Err(StoreError::MerchantNotFound(merchant_id));
        }
        merchants::insert_device_token(merchant_id, token, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn set_merchant_active(&self, merchant_id: i64, active: bool) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        match merchants::set_active(merchant_id, active, &mut conn).await? {
            0 => Err(StoreError::MerchantNotFound(merchant_id)),
            _ => Ok(()),
        }
    }
}

impl NotificationManagement for SqliteDatabase {
    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let notification = notifications::insert_notification(notification, &mut conn).await?;
        Ok(notification)
    }

    async fn insert_audit_log(&self, entry: NewAuditLogEntry) -> Result<AuditLogEntry, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let entry = notifications::insert_audit_log(entry, &mut conn).await?;
        Ok(entry)
    }

    async fn fetch_notifications_for(&self, recipient_id: i64) -> Result<Vec<Notification>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let result = notifications::fetch_notifications_for(recipient_id, &mut conn).await?;
        Ok(result)
    }

    async fn fetch_audit_logs_for(
        &self,
        resource_type: &str,
        resource_id: &str,
    ) -> Result<Vec<AuditLogEntry>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let result = notifications::fetch_audit_logs_for(resource_type, resource_id, &mut conn).await?;
        Ok(result)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `SPG_DATABASE_URL`
    pub async fn new(max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date. Safe to call on every start.
    pub async fn run_migrations(&self) -> Result<(), SqliteDatabaseError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
