use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::{types::Json, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, OrderReference, PaymentStatus},
    traits::{StoreError, TransitionOutcome},
};

/// Inserts a new order into the database using the given connection. This is not atomic. You can embed this call
/// inside a transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
///
/// Every order starts out `pending`.
pub async fn insert_order(
    reference: &OrderReference,
    order: &NewOrder,
    conn: &mut SqliteConnection,
) -> Result<Order, StoreError> {
    let result = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_reference,
                admin_id,
                customer_id,
                customer_name,
                customer_email,
                customer_phone,
                order_details,
                total_amount,
                currency,
                verification_code
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *;
        "#,
    )
    .bind(reference.as_str())
    .bind(order.admin_id)
    .bind(order.customer_id)
    .bind(&order.customer_name)
    .bind(&order.customer_email)
    .bind(&order.customer_phone)
    .bind(Json(&order.order_details))
    .bind(order.total_amount.value())
    .bind(&order.currency)
    .bind(&order.verification_code)
    .fetch_one(conn)
    .await;
    match result {
        Ok(order) => Ok(order),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(StoreError::ReferenceCollision(reference.clone()))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_order_by_reference(
    reference: &OrderReference,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE order_reference = $1")
        .bind(reference.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// The compare-and-set at the heart of settlement. The `WHERE payment_status = 'pending'` guard makes the write a
/// no-op for settled orders, so concurrent or replayed calls can never overwrite a terminal status or its
/// `payment_date`.
pub async fn transition_payment_status(
    reference: &OrderReference,
    new_status: PaymentStatus,
    payment_date: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<TransitionOutcome, StoreError> {
    if !new_status.is_terminal() {
        return Err(StoreError::InvalidTransition(new_status));
    }
    let updated: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders
            SET payment_status = $1, payment_date = $2, updated_at = CURRENT_TIMESTAMP
            WHERE order_reference = $3 AND payment_status = 'pending'
            RETURNING *;
        "#,
    )
    .bind(new_status)
    .bind(payment_date)
    .bind(reference.as_str())
    .fetch_optional(&mut *conn)
    .await?;
    if let Some(order) = updated {
        debug!("🗃️ Order {reference} is now {new_status}");
        return Ok(TransitionOutcome::Applied(order));
    }
    trace!("🗃️ Order {reference} was not pending. Checking whether it exists");
    match fetch_order_by_reference(reference, conn).await? {
        Some(order) => {
            debug!("🗃️ Order {reference} is already {}. Transition to {new_status} skipped", order.payment_status);
            Ok(TransitionOutcome::Unchanged(order))
        },
        None => Err(StoreError::OrderNotFound(reference.clone())),
    }
}
