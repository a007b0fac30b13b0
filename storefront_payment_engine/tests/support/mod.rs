#![allow(dead_code)]
use std::sync::{Arc, Mutex};

use serde_json::json;
use spg_common::MinorUnits;
use storefront_payment_engine::{
    db_types::{Merchant, NewMerchant, NewOrder, Order},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    traits::{MerchantManagement, OrderManagement, PushError, PushMessage, PushNotifier},
    SqliteDatabase,
};

pub async fn prepare_test_db() -> SqliteDatabase {
    prepare_test_env(&random_db_path()).await
}

pub async fn seed_merchant(db: &SqliteDatabase, subaccount: Option<&str>) -> Merchant {
    let merchant = NewMerchant {
        business_name: "Ada's Bags".into(),
        email: format!("owner{}@adasbags.ng", rand::random::<u32>()),
        phone: Some("+2348031234567".into()),
        subaccount_code: subaccount.map(String::from),
        ..Default::default()
    };
    db.insert_merchant(merchant).await.expect("Error creating merchant")
}

/// A single 5000.00 line priced with the default fee schedule.
pub fn new_order(admin_id: i64) -> NewOrder {
    NewOrder::new(admin_id, "Chidi Okeke", "chidi@example.com", MinorUnits::from(542_500))
        .with_phone("08099998888")
        .with_details(json!([{
            "product_id": 7, "name": "Ankara tote", "quantity": 1,
            "price": 5000, "paystack_fee": 175, "superadmin_fee": 250, "adjusted_price": 5425
        }]))
}

pub async fn seed_order(db: &SqliteDatabase, admin_id: i64, total: MinorUnits) -> Order {
    let mut order = new_order(admin_id);
    order.total_amount = total;
    db.insert_order(order, "TEST").await.expect("Error creating order")
}

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<(Vec<String>, PushMessage)>>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self { fail: true, ..Default::default() }
    }

    pub fn sent(&self) -> Vec<(Vec<String>, PushMessage)> {
        self.sent.lock().unwrap().clone()
    }
}

impl PushNotifier for RecordingNotifier {
    async fn send(&self, tokens: &[String], message: &PushMessage) -> Result<(), PushError> {
        if self.fail {
            return Err(PushError::Transport("connection refused".into()));
        }
        self.sent.lock().unwrap().push((tokens.to_vec(), message.clone()));
        Ok(())
    }
}
