use actix_web::{body::to_bytes, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use log::debug;
use serde_json::json;
use spg_common::{MinorUnits, Secret};
use storefront_payment_engine::{
    db_types::{Merchant, NewMerchant, NewOrder, Order},
    helpers::WebhookVerifier,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    traits::{MerchantManagement, OrderManagement},
    SqliteDatabase,
};

use crate::server::json_config;

pub const WEBHOOK_SECRET: &str = "sk_test_5b1c0f3e9d2a4c7b8e6f";

/// Runs one request through an app built by `configure`. Errors raised by middleware are rendered the same way the
/// server would render them.
pub async fn send_request(req: TestRequest, configure: impl FnOnce(&mut ServiceConfig)) -> (StatusCode, String) {
    let app = App::new().app_data(json_config()).configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let body = to_bytes(res.into_body()).await.unwrap();
            (status, String::from_utf8_lossy(&body).into_owned())
        },
        Err(e) => {
            let res = e.error_response();
            let status = res.status();
            let body = to_bytes(res.into_body()).await.unwrap();
            (status, String::from_utf8_lossy(&body).into_owned())
        },
    }
}

pub async fn prepare_db() -> SqliteDatabase {
    prepare_test_env(&random_db_path()).await
}

pub async fn seed_merchant(db: &SqliteDatabase, subaccount: Option<&str>, tokens: &[&str]) -> Merchant {
    let merchant = NewMerchant {
        business_name: "Ada's Bags".into(),
        email: format!("owner{}@adasbags.ng", rand::random::<u32>()),
        phone: Some("08031234567".into()),
        subaccount_code: subaccount.map(String::from),
        ..Default::default()
    };
    let merchant = db.insert_merchant(merchant).await.expect("Error creating merchant");
    for token in tokens {
        db.register_device_token(merchant.id, token).await.expect("Error registering device");
    }
    merchant
}

/// One 5000.00 tote, priced with the default fee schedule. The customer pays 5425.00.
pub fn line_items() -> serde_json::Value {
    json!([{
        "product_id": 7, "name": "Ankara tote", "quantity": 1,
        "price": 5000, "paystack_fee": 175, "superadmin_fee": 250, "adjusted_price": 5425
    }])
}

pub async fn seed_order(db: &SqliteDatabase, admin_id: i64, total: MinorUnits) -> Order {
    let order = NewOrder::new(admin_id, "Chidi Okeke", "chidi@example.com", total)
        .with_phone("08099998888")
        .with_details(line_items());
    db.insert_order(order, "TEST").await.expect("Error creating order")
}

pub fn verifier() -> WebhookVerifier {
    WebhookVerifier::new(Secret::new(WEBHOOK_SECRET.to_string())).unwrap()
}

pub fn charge_body(event: &str, reference: &str, kobo: i64) -> String {
    json!({
        "event": event,
        "data": {
            "id": 302961,
            "status": if event == "charge.success" { "success" } else { "failed" },
            "reference": reference,
            "amount": kobo,
            "currency": "NGN",
            "paid_at": "2024-08-01T10:15:00.000Z",
            "customer": {"id": 84312, "email": "chidi@example.com"}
        }
    })
    .to_string()
}

/// A webhook delivery signed with the test secret.
pub fn signed_webhook(body: &str) -> TestRequest {
    let signature = verifier().sign(body.as_bytes());
    TestRequest::post()
        .uri("/webhooks/paystack")
        .insert_header(("x-paystack-signature", signature))
        .insert_header(("content-type", "application/json"))
        .peer_addr("52.31.139.75:443".parse().unwrap())
        .set_payload(body.to_string())
}
