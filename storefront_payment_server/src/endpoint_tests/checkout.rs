use actix_web::{http::StatusCode, test::TestRequest, web};
use serde_json::{json, Value};
use spg_common::MinorUnits;
use storefront_payment_engine::{
    db_types::{OrderReference, PaymentStatus},
    helpers::FeeSchedule,
    traits::{MerchantManagement, OrderManagement},
    CheckoutApi,
    SqliteDatabase,
};

use super::helpers::{line_items, prepare_db, seed_merchant, send_request};
use crate::{
    config::ServerOptions,
    routes::{fees, CheckoutRoute},
};

fn configure_fees(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::Data::new(FeeSchedule::default())).service(web::scope("/api").service(fees));
}

fn configure_checkout(db: SqliteDatabase) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(CheckoutApi::new(db)))
            .app_data(web::Data::new(ServerOptions::default()))
            .service(web::scope("/api").service(CheckoutRoute::<SqliteDatabase>::new()));
    }
}

fn cart(admin_id: i64) -> Value {
    json!({
        "admin_id": admin_id,
        "customer_name": "Chidi Okeke",
        "customer_email": "chidi@example.com",
        "customer_phone": "08099998888",
        "order_details": line_items(),
        "total_amount": 5425.00
    })
}

#[actix_web::test]
async fn fee_breakdown() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/api/fees?price=5000.00");
    let (status, body) = send_request(req, configure_fees).await;
    assert_eq!(status, StatusCode::OK);
    let breakdown: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(breakdown["price"], json!(5000.0));
    assert_eq!(breakdown["paystack_fee"], json!(175.0));
    assert_eq!(breakdown["superadmin_fee"], json!(250.0));
    assert_eq!(breakdown["adjusted_price"], json!(5425.0));
}

#[actix_web::test]
async fn fee_breakdown_rejects_bad_prices() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send_request(TestRequest::get().uri("/api/fees?price=0"), configure_fees).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Price must be greater than zero"), "{body}");
    let (status, _) = send_request(TestRequest::get().uri("/api/fees?price=12.345"), configure_fees).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn checkout_creates_pending_order() {
    let _ = env_logger::try_init().ok();
    let db = prepare_db().await;
    let merchant = seed_merchant(&db, Some("ACCT_8f4k1"), &[]).await;
    let req = TestRequest::post().uri("/api/checkout").set_json(cart(merchant.id));
    let (status, body) = send_request(req, configure_checkout(db.clone())).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let response: Value = serde_json::from_str(&body).unwrap();
    let reference = response["order_reference"].as_str().unwrap();
    assert!(reference.starts_with("SHOP-"), "{reference}");
    assert_eq!(response["order"]["total_amount"], json!(5425.0));
    assert_eq!(response["order"]["payment_status"], "pending");
    let order = db.fetch_order_by_reference(&OrderReference::from(reference)).await.unwrap().unwrap();
    assert_eq!(order.total_amount, MinorUnits::from(542_500));
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert_eq!(order.currency, "NGN");
}

#[actix_web::test]
async fn checkout_validation() {
    let _ = env_logger::try_init().ok();
    let db = prepare_db().await;
    let merchant = seed_merchant(&db, None, &[]).await;
    let mut bad_email = cart(merchant.id);
    bad_email["customer_email"] = json!("not-an-email");
    let req = TestRequest::post().uri("/api/checkout").set_json(bad_email);
    let (status, body) = send_request(req, configure_checkout(db.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("not a valid email address"), "{body}");

    let mut no_lines = cart(merchant.id);
    no_lines["order_details"] = json!([]);
    let req = TestRequest::post().uri("/api/checkout").set_json(no_lines);
    let (status, _) = send_request(req, configure_checkout(db.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut short_total = cart(merchant.id);
    short_total["total_amount"] = json!(100.00);
    let req = TestRequest::post().uri("/api/checkout").set_json(short_total);
    let (status, body) = send_request(req, configure_checkout(db.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("does not match the order lines"), "{body}");

    let mut negative = cart(merchant.id);
    negative["order_details"][0]["quantity"] = json!(-3);
    negative["total_amount"] = json!(-16275.00);
    let req = TestRequest::post().uri("/api/checkout").set_json(negative.clone());
    let (status, _) = send_request(req, configure_checkout(db.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    negative["total_amount"] = json!(5425.00);
    let req = TestRequest::post().uri("/api/checkout").set_json(negative);
    let (status, body) = send_request(req, configure_checkout(db.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("has a quantity of -3"), "{body}");

    let mut free_platform = cart(merchant.id);
    free_platform["order_details"][0]["superadmin_fee"] = json!(0);
    let req = TestRequest::post().uri("/api/checkout").set_json(free_platform);
    let (status, _) = send_request(req, configure_checkout(db.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = TestRequest::post().uri("/api/checkout").set_json(json!({"admin_id": merchant.id}));
    let (status, body) = send_request(req, configure_checkout(db)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.starts_with(r#"{"error":"#), "{body}");
}

#[actix_web::test]
async fn checkout_requires_an_active_store() {
    let _ = env_logger::try_init().ok();
    let db = prepare_db().await;
    let merchant = seed_merchant(&db, None, &[]).await;
    db.set_merchant_active(merchant.id, false).await.unwrap();
    let req = TestRequest::post().uri("/api/checkout").set_json(cart(merchant.id));
    let (status, _) = send_request(req, configure_checkout(db.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let req = TestRequest::post().uri("/api/checkout").set_json(cart(merchant.id + 100));
    let (status, body) = send_request(req, configure_checkout(db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Merchant not found"), "{body}");
}
