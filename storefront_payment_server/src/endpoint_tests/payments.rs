use actix_web::{http::StatusCode, test::TestRequest, web};
use serde_json::{json, Value};
use spg_common::MinorUnits;
use storefront_payment_engine::{
    db_types::{Order, PaymentEvent, PaymentEventKind, PaymentStatus},
    payment_objects::PaymentConfig,
    traits::{FeeBearer, NotificationManagement, OrderManagement, PaymentAuthorization, ProviderError},
    PaymentApi,
    SettlementApi,
    SqliteDatabase,
};

use super::{
    helpers::{prepare_db, seed_merchant, seed_order, send_request},
    mocks::{MockPaymentGateway, MockPushService},
};
use crate::{
    config::ServerOptions,
    routes::{InitializePaymentRoute, VerifyPaymentRoute},
};

fn configure(
    db: SqliteDatabase,
    provider: MockPaymentGateway,
    push: MockPushService,
) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        let payments = PaymentApi::new(db.clone(), provider, PaymentConfig::default());
        let settlement = SettlementApi::new(db, push);
        cfg.app_data(web::Data::new(payments))
            .app_data(web::Data::new(settlement))
            .app_data(web::Data::new(ServerOptions::default()))
            .service(
                web::scope("/api")
                    .service(InitializePaymentRoute::<SqliteDatabase, MockPaymentGateway>::new())
                    .service(VerifyPaymentRoute::<SqliteDatabase, MockPaymentGateway, MockPushService>::new()),
            );
    }
}

fn initialize_request(order: &Order, amount: f64) -> TestRequest {
    TestRequest::post().uri("/api/payments/initialize").set_json(json!({
        "order_id": order.order_reference.as_str(),
        "email": "chidi@example.com",
        "amount": amount,
        "admin_id": order.admin_id,
        "customer_name": "Chidi Okeke",
        "customer_phone": "08099998888"
    }))
}

fn verify_request(order: &Order) -> TestRequest {
    TestRequest::post()
        .uri("/api/payments/verify")
        .set_json(json!({ "reference": order.order_reference.as_str() }))
}

fn provider_reports(order: &Order, kind: PaymentEventKind) -> MockPaymentGateway {
    let event = PaymentEvent {
        kind,
        reference: order.order_reference.clone(),
        amount: order.total_amount,
        currency: order.currency.clone(),
        customer_email: order.customer_email.clone(),
    };
    let mut provider = MockPaymentGateway::new();
    provider.expect_verify_transaction().times(1).returning(move |_| Ok(Some(event.clone())));
    provider
}

#[actix_web::test]
async fn initialize_payment_with_split() {
    let _ = env_logger::try_init().ok();
    let db = prepare_db().await;
    let merchant = seed_merchant(&db, Some("ACCT_8f4k1"), &[]).await;
    let order = seed_order(&db, merchant.id, MinorUnits::from(542_500)).await;
    let reference = order.order_reference.clone();
    let mut provider = MockPaymentGateway::new();
    provider
        .expect_initialize_transaction()
        .withf(move |req| {
            let split = req.split.as_ref();
            req.reference == reference &&
                req.amount == MinorUnits::from(542_500) &&
                split.map(|s| s.subaccount.as_str()) == Some("ACCT_8f4k1") &&
                split.map(|s| s.transaction_charge) == Some(MinorUnits::from(42_500)) &&
                split.map(|s| s.bearer) == Some(FeeBearer::Account)
        })
        .times(1)
        .returning(|req| {
            Ok(PaymentAuthorization {
                authorization_url: "https://checkout.paystack.com/0peioxfhpn".into(),
                access_code: "0peioxfhpn".into(),
                reference: req.reference.to_string(),
            })
        });
    let req = initialize_request(&order, 5425.00);
    let (status, body) = send_request(req, configure(db, provider, MockPushService::new())).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let session: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(session["authorization_url"], "https://checkout.paystack.com/0peioxfhpn");
    assert_eq!(session["access_code"], "0peioxfhpn");
    assert_eq!(session["reference"], order.order_reference.as_str());
    let redirect = session["redirect_url"].as_str().unwrap();
    assert!(redirect.starts_with("https://wa.me/2348031234567?text="), "{redirect}");
}

#[actix_web::test]
async fn provider_failure_leaves_order_pending() {
    let _ = env_logger::try_init().ok();
    let db = prepare_db().await;
    let merchant = seed_merchant(&db, None, &[]).await;
    let order = seed_order(&db, merchant.id, MinorUnits::from(542_500)).await;
    let mut provider = MockPaymentGateway::new();
    provider
        .expect_initialize_transaction()
        .times(1)
        .returning(|_| Err(ProviderError::Unavailable("connection reset".into())));
    let req = initialize_request(&order, 5425.00);
    let (status, body) = send_request(req, configure(db.clone(), provider, MockPushService::new())).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("Payment could not be started"), "{body}");
    let stored = db.fetch_order_by_reference(&order.order_reference).await.unwrap().unwrap();
    assert_eq!(stored.payment_status, PaymentStatus::Pending);
}

#[actix_web::test]
async fn initialize_payment_validation() {
    let _ = env_logger::try_init().ok();
    let db = prepare_db().await;
    let merchant = seed_merchant(&db, None, &[]).await;
    let order = seed_order(&db, merchant.id, MinorUnits::from(542_500)).await;

    let req = initialize_request(&order, 4000.00);
    let (status, body) = send_request(req, configure(db.clone(), MockPaymentGateway::new(), MockPushService::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("does not match the order total"), "{body}");

    let req = TestRequest::post().uri("/api/payments/initialize").set_json(json!({
        "order_id": "SHOP-1722500000000-ZZZZZZ",
        "email": "chidi@example.com",
        "amount": 5425.00,
        "admin_id": merchant.id,
    }));
    let (status, body) = send_request(req, configure(db.clone(), MockPaymentGateway::new(), MockPushService::new())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Order not found"), "{body}");

    db.transition_payment_status(&order.order_reference, PaymentStatus::Completed, chrono::Utc::now()).await.unwrap();
    let req = initialize_request(&order, 5425.00);
    let (status, _) = send_request(req, configure(db, MockPaymentGateway::new(), MockPushService::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn verify_settles_once() {
    let _ = env_logger::try_init().ok();
    let db = prepare_db().await;
    let merchant = seed_merchant(&db, None, &["device-1"]).await;
    let order = seed_order(&db, merchant.id, MinorUnits::from(542_500)).await;

    let mut push = MockPushService::new();
    push.expect_send()
        .withf(|tokens, _| tokens.len() == 1 && tokens[0] == "device-1")
        .times(1)
        .returning(|_, _| Ok(()));
    let provider = provider_reports(&order, PaymentEventKind::Success);
    let (status, body) = send_request(verify_request(&order), configure(db.clone(), provider, push)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let response: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["payment_status"], "completed");
    assert_eq!(response["outcome"], "completed");

    // A webhook may already have settled it. Nothing is sent the second time.
    let provider = provider_reports(&order, PaymentEventKind::Success);
    let (status, body) = send_request(verify_request(&order), configure(db.clone(), provider, MockPushService::new())).await;
    assert_eq!(status, StatusCode::OK);
    let response: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["outcome"], "duplicate");
    assert_eq!(db.fetch_notifications_for(merchant.id).await.unwrap().len(), 1);
    let audit = db.fetch_audit_logs_for("order", order.order_reference.as_str()).await.unwrap();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].actor, "payment-verification");
}

#[actix_web::test]
async fn verify_reports_failed_payments() {
    let _ = env_logger::try_init().ok();
    let db = prepare_db().await;
    let merchant = seed_merchant(&db, None, &[]).await;
    let order = seed_order(&db, merchant.id, MinorUnits::from(542_500)).await;
    let provider = provider_reports(&order, PaymentEventKind::Failure);
    let (status, body) = send_request(verify_request(&order), configure(db.clone(), provider, MockPushService::new())).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert!(body.contains("Payment failed"), "{body}");
    let stored = db.fetch_order_by_reference(&order.order_reference).await.unwrap().unwrap();
    assert_eq!(stored.payment_status, PaymentStatus::Failed);
}

#[actix_web::test]
async fn verify_pending_and_unknown() {
    let _ = env_logger::try_init().ok();
    let db = prepare_db().await;
    let merchant = seed_merchant(&db, None, &[]).await;
    let order = seed_order(&db, merchant.id, MinorUnits::from(542_500)).await;
    let mut provider = MockPaymentGateway::new();
    provider.expect_verify_transaction().times(1).returning(|_| Ok(None));
    let (status, body) = send_request(verify_request(&order), configure(db.clone(), provider, MockPushService::new())).await;
    assert_eq!(status, StatusCode::OK);
    let response: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["payment_status"], "pending");
    assert_eq!(response["outcome"], "pending");

    let mut provider = MockPaymentGateway::new();
    provider.expect_verify_transaction().times(1).returning(|_| Err(ProviderError::Timeout));
    let (status, _) = send_request(verify_request(&order), configure(db, provider, MockPushService::new())).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}
