use actix_web::{http::StatusCode, test::TestRequest, web};
use serde_json::{json, Value};
use spg_common::MinorUnits;
use storefront_payment_engine::{
    db_types::{NotificationType, Order, PaymentStatus},
    traits::{NotificationManagement, OrderManagement},
    SettlementApi,
    SqliteDatabase,
};

use super::{
    helpers::{charge_body, prepare_db, seed_merchant, seed_order, send_request, signed_webhook, verifier},
    mocks::MockPushService,
};
use crate::{config::ServerOptions, middleware::HmacMiddlewareFactory, webhook_routes::PaystackWebhookRoute};

fn configure(db: SqliteDatabase, push: MockPushService) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(SettlementApi::new(db, push)))
            .app_data(web::Data::new(ServerOptions::default()))
            .service(
                web::scope("/webhooks")
                    .wrap(HmacMiddlewareFactory::new("x-paystack-signature", verifier()))
                    .service(PaystackWebhookRoute::<SqliteDatabase, MockPushService>::new()),
            );
    }
}

fn delivery(body: Vec<u8>, signature: &str) -> TestRequest {
    TestRequest::post()
        .uri("/webhooks/paystack")
        .insert_header(("x-paystack-signature", signature))
        .insert_header(("content-type", "application/json"))
        .peer_addr("52.31.139.75:443".parse().unwrap())
        .set_payload(body)
}

fn expect_one_push(token: &'static str) -> MockPushService {
    let mut push = MockPushService::new();
    push.expect_send().withf(move |tokens, _| tokens.len() == 1 && tokens[0] == token).times(1).returning(|_, _| Ok(()));
    push
}

async fn status_of(db: &SqliteDatabase, order: &Order) -> PaymentStatus {
    db.fetch_order_by_reference(&order.order_reference).await.unwrap().unwrap().payment_status
}

fn message_of(body: &str) -> String {
    let response: Value = serde_json::from_str(body).unwrap();
    assert_eq!(response["success"], true, "{body}");
    response["message"].as_str().unwrap().to_string()
}

#[actix_web::test]
async fn unsigned_webhooks_are_rejected() {
    let _ = env_logger::try_init().ok();
    let db = prepare_db().await;
    let merchant = seed_merchant(&db, None, &[]).await;
    let order = seed_order(&db, merchant.id, MinorUnits::from(542_500)).await;
    let body = charge_body("charge.success", order.order_reference.as_str(), 542_500);

    let req = TestRequest::post()
        .uri("/webhooks/paystack")
        .insert_header(("content-type", "application/json"))
        .set_payload(body.clone());
    let (status, body_text) = send_request(req, configure(db.clone(), MockPushService::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body_text.contains("Webhook signature is missing or invalid"), "{body_text}");

    let req = delivery(body.clone().into_bytes(), "not-a-signature");
    let (status, _) = send_request(req, configure(db.clone(), MockPushService::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let signature = verifier().sign(body.as_bytes());
    let mut forged = signature.clone().into_bytes();
    forged[0] = if forged[0] == b'0' { b'1' } else { b'0' };
    let req = delivery(body.clone().into_bytes(), &String::from_utf8(forged).unwrap());
    let (status, _) = send_request(req, configure(db.clone(), MockPushService::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert_eq!(status_of(&db, &order).await, PaymentStatus::Pending);
    assert!(db.fetch_notifications_for(merchant.id).await.unwrap().is_empty());
}

#[actix_web::test]
async fn tampered_bodies_are_rejected() {
    let _ = env_logger::try_init().ok();
    let db = prepare_db().await;
    let merchant = seed_merchant(&db, None, &[]).await;
    let order = seed_order(&db, merchant.id, MinorUnits::from(542_500)).await;
    let body = charge_body("charge.success", order.order_reference.as_str(), 542_500);
    let signature = verifier().sign(body.as_bytes());
    let original = body.into_bytes();
    for index in (0..original.len()).step_by(11) {
        for bit in [0u8, 3, 6] {
            let mut tampered = original.clone();
            tampered[index] ^= 1 << bit;
            let (status, _) = send_request(delivery(tampered, &signature), configure(db.clone(), MockPushService::new())).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "flipping bit {bit} of byte {index} was accepted");
        }
    }
    assert_eq!(status_of(&db, &order).await, PaymentStatus::Pending);
}

#[actix_web::test]
async fn successful_charge_settles_once() {
    let _ = env_logger::try_init().ok();
    let db = prepare_db().await;
    let merchant = seed_merchant(&db, Some("ACCT_8f4k1"), &["device-1"]).await;
    let order = seed_order(&db, merchant.id, MinorUnits::from(542_500)).await;
    let body = charge_body("charge.success", order.order_reference.as_str(), 542_500);

    let (status, text) = send_request(signed_webhook(&body), configure(db.clone(), expect_one_push("device-1"))).await;
    assert_eq!(status, StatusCode::OK, "{text}");
    assert_eq!(message_of(&text), "completed");
    let stored = db.fetch_order_by_reference(&order.order_reference).await.unwrap().unwrap();
    assert_eq!(stored.payment_status, PaymentStatus::Completed);
    assert!(stored.payment_date.is_some());

    // Paystack redelivers. The order, notifications and devices are left alone.
    let (status, text) = send_request(signed_webhook(&body), configure(db.clone(), MockPushService::new())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(message_of(&text), "duplicate");
    let again = db.fetch_order_by_reference(&order.order_reference).await.unwrap().unwrap();
    assert_eq!(again.payment_date, stored.payment_date);

    let notifications = db.fetch_notifications_for(merchant.id).await.unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].notification_type, NotificationType::OrderPaid);
    let audit = db.fetch_audit_logs_for("order", order.order_reference.as_str()).await.unwrap();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].actor, "paystack-webhook");
    assert_eq!(audit[0].ip_address.as_deref(), Some("52.31.139.75"));
}

#[actix_web::test]
async fn unknown_references_are_acknowledged() {
    let _ = env_logger::try_init().ok();
    let db = prepare_db().await;
    let merchant = seed_merchant(&db, None, &["device-1"]).await;
    let order = seed_order(&db, merchant.id, MinorUnits::from(542_500)).await;
    let body = charge_body("charge.success", "SHOP-1722500000000-ZZZZZZ", 542_500);
    let (status, text) = send_request(signed_webhook(&body), configure(db.clone(), MockPushService::new())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(message_of(&text), "ignored");
    assert_eq!(status_of(&db, &order).await, PaymentStatus::Pending);
    assert!(db.fetch_notifications_for(merchant.id).await.unwrap().is_empty());
}

#[actix_web::test]
async fn mismatched_amounts_are_flagged() {
    let _ = env_logger::try_init().ok();
    let db = prepare_db().await;
    let merchant = seed_merchant(&db, None, &[]).await;
    let order = seed_order(&db, merchant.id, MinorUnits::from(542_500)).await;
    let body = charge_body("charge.success", order.order_reference.as_str(), 400_000);
    let (status, text) = send_request(signed_webhook(&body), configure(db.clone(), MockPushService::new())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(message_of(&text), "flagged");
    assert_eq!(status_of(&db, &order).await, PaymentStatus::Pending);
    let notifications = db.fetch_notifications_for(merchant.id).await.unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].notification_type, NotificationType::PaymentFlagged);
    let audit = db.fetch_audit_logs_for("order", order.order_reference.as_str()).await.unwrap();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].action, "payment.amount_mismatch");

    // The correct amount still settles the order afterwards
    let body = charge_body("charge.success", order.order_reference.as_str(), 542_500);
    let (status, text) = send_request(signed_webhook(&body), configure(db.clone(), MockPushService::new())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(message_of(&text), "completed");
    assert_eq!(status_of(&db, &order).await, PaymentStatus::Completed);
}

#[actix_web::test]
async fn failed_charge_fails_the_order() {
    let _ = env_logger::try_init().ok();
    let db = prepare_db().await;
    let merchant = seed_merchant(&db, None, &["device-1"]).await;
    let order = seed_order(&db, merchant.id, MinorUnits::from(542_500)).await;
    let body = charge_body("charge.failed", order.order_reference.as_str(), 542_500);
    let (status, text) = send_request(signed_webhook(&body), configure(db.clone(), expect_one_push("device-1"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(message_of(&text), "failed");
    assert_eq!(status_of(&db, &order).await, PaymentStatus::Failed);

    // A late success for a failed order is a duplicate, not a second settlement
    let body = charge_body("charge.success", order.order_reference.as_str(), 542_500);
    let (status, text) = send_request(signed_webhook(&body), configure(db.clone(), MockPushService::new())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(message_of(&text), "duplicate");
    assert_eq!(status_of(&db, &order).await, PaymentStatus::Failed);
}

#[actix_web::test]
async fn unsupported_and_malformed_events() {
    let _ = env_logger::try_init().ok();
    let db = prepare_db().await;
    let body = json!({"event": "transfer.success", "data": {"reference": "TRF_1x2y3z"}}).to_string();
    let (status, text) = send_request(signed_webhook(&body), configure(db.clone(), MockPushService::new())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(message_of(&text), "ignored");

    let body = json!({"event": "charge.success", "data": {"status": "success"}}).to_string();
    let (status, text) = send_request(signed_webhook(&body), configure(db.clone(), MockPushService::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(text.starts_with(r#"{"error":"#), "{text}");

    let (status, _) = send_request(signed_webhook("{not json"), configure(db, MockPushService::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
