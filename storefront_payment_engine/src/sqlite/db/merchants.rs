use log::trace;
use sqlx::SqliteConnection;

use crate::db_types::{Merchant, NewMerchant};

const MERCHANT_COLUMNS: &str =
    "id, business_name, email, phone, account_number, bank_code, subaccount_code, is_active";

pub async fn fetch_merchant(id: i64, conn: &mut SqliteConnection) -> Result<Option<Merchant>, sqlx::Error> {
    let merchant = sqlx::query_as(&format!("SELECT {MERCHANT_COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(merchant)
}

pub async fn insert_merchant(merchant: NewMerchant, conn: &mut SqliteConnection) -> Result<Merchant, sqlx::Error> {
    let merchant: Merchant = sqlx::query_as(&format!(
        r#"
            INSERT INTO users (business_name, email, phone, account_number, bank_code, subaccount_code)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {MERCHANT_COLUMNS};
        "#
    ))
    .bind(merchant.business_name)
    .bind(merchant.email)
    .bind(merchant.phone)
    .bind(merchant.account_number)
    .bind(merchant.bank_code)
    .bind(merchant.subaccount_code)
    .fetch_one(conn)
    .await?;
    trace!("🗃️ Merchant #{} ({}) created", merchant.id, merchant.business_name);
    Ok(merchant)
}

pub async fn set_active(id: i64, active: bool, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET is_active = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
        .bind(active)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

pub async fn fetch_device_tokens(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<String>, sqlx::Error> {
    let tokens: Vec<(String,)> = sqlx::query_as("SELECT token FROM device_tokens WHERE user_id = $1 ORDER BY id")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(tokens.into_iter().map(|(t,)| t).collect())
}

pub async fn insert_device_token(user_id: i64, token: &str, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO device_tokens (user_id, token) VALUES ($1, $2) ON CONFLICT DO NOTHING")
        .bind(user_id)
        .bind(token)
        .execute(conn)
        .await?;
    Ok(())
}
