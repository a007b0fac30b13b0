use std::time::Duration;

use actix_web::{
    dev::{Server, Service},
    error::JsonPayloadError,
    http::KeepAlive,
    middleware::Logger,
    web,
    App,
    HttpRequest,
    HttpServer,
};
use futures::{future::ok, FutureExt};
use log::{info, warn};
use storefront_payment_engine::{helpers::WebhookVerifier, CheckoutApi, PaymentApi, SettlementApi, SqliteDatabase};

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    helpers::get_remote_ip,
    integrations::{FcmNotifier, PaystackProvider},
    middleware::HmacMiddlewareFactory,
    routes::{fees, health, CheckoutRoute, InitializePaymentRoute, VerifyPaymentRoute},
    webhook_routes::PaystackWebhookRoute,
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let provider =
        PaystackProvider::new(config.paystack.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let push = FcmNotifier::new(&config.fcm_url, &config.fcm_server_key, config.push_timeout)
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let verifier = WebhookVerifier::new(config.webhook_secret.clone())
        .map_err(|e| ServerError::ConfigurationError(format!("{e}. Set SPG_WEBHOOK_SECRET.")))?;
    let srv = create_server_instance(config, db, provider, push, verifier)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    provider: PaystackProvider,
    push: FcmNotifier,
    verifier: WebhookVerifier,
) -> Result<Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let checkout_api = CheckoutApi::new(db.clone()).with_reference_prefix(&config.order_reference_prefix);
        let payment_api = PaymentApi::new(db.clone(), provider.clone(), config.payment_config());
        let settlement_api = SettlementApi::new(db.clone(), push.clone()).with_push_timeout(config.push_timeout);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("spg::access_log"))
            .app_data(json_config())
            .app_data(web::Data::new(checkout_api))
            .app_data(web::Data::new(payment_api))
            .app_data(web::Data::new(settlement_api))
            .app_data(web::Data::new(config.fee_schedule))
            .app_data(web::Data::new(ServerOptions::from_config(&config)));
        let api_scope = web::scope("/api")
            .service(fees)
            .service(CheckoutRoute::<SqliteDatabase>::new())
            .service(InitializePaymentRoute::<SqliteDatabase, PaystackProvider>::new())
            .service(VerifyPaymentRoute::<SqliteDatabase, PaystackProvider, FcmNotifier>::new());
        let use_x_forwarded_for = config.use_x_forwarded_for;
        let use_forwarded = config.use_forwarded;
        let paystack_whitelist = config.paystack_whitelist.clone();
        let webhook_scope = web::scope("/webhooks")
            .wrap(HmacMiddlewareFactory::new(&config.webhook_signature_header, verifier.clone()))
            .wrap_fn(move |req, srv| {
                let peer_ip = get_remote_ip(req.request(), use_x_forwarded_for, use_forwarded);
                let whitelisted = match (peer_ip, &paystack_whitelist) {
                    (Some(ip), Some(whitelist)) => {
                        info!("Paystack webhook from {ip}");
                        whitelist.contains(&ip)
                    },
                    (_, None) => true,
                    (None, Some(_)) => {
                        warn!("No IP address found in webhook remote peer request, denying access.");
                        false
                    },
                };
                if whitelisted {
                    srv.call(req).boxed_local()
                } else {
                    let err = ServerError::Forbidden("Webhook deliveries are not accepted from this address".into());
                    ok(req.error_response(err)).boxed_local()
                }
            })
            .service(PaystackWebhookRoute::<SqliteDatabase, FcmNotifier>::new());
        app.service(health).service(api_scope).service(webhook_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}

/// Renders JSON body errors in the same `{"error": ...}` shape as every other error.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
        ServerError::InvalidRequestBody(err.to_string()).into()
    })
}
