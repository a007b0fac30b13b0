//! Webhook deliveries only reach these handlers after the HMAC middleware has checked their signature.
//!
//! Paystack redelivers anything that is not answered with a 2xx, so every outcome that cannot improve on retry
//! (duplicates, unknown references, flagged amounts, unsupported events) is acknowledged with a 200. Only a storage
//! failure gets a 500, so that the event is delivered again once the database is back.

use actix_web::{web, HttpRequest, HttpResponse};
use log::*;
use paystack_tools::PaystackWebhookEvent;
use storefront_payment_engine::{
    settlement_objects::{EventProvenance, SettlementOutcome},
    traits::{PushNotifier, StorefrontDatabase},
    SettlementApi,
};

use crate::{
    config::ServerOptions,
    data_objects::JsonResponse,
    errors::ServerError,
    helpers::with_request_details,
    integrations::paystack::payment_event_from_webhook,
    route,
};

route!(paystack_webhook => Post "/paystack" impl StorefrontDatabase, PushNotifier);
pub async fn paystack_webhook<B, N>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<SettlementApi<B, N>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError>
where
    B: StorefrontDatabase,
    N: PushNotifier,
{
    let event = PaystackWebhookEvent::from_slice(body.as_ref()).map_err(|e| {
        warn!("💳️ Could not decode webhook payload. {e}");
        ServerError::from(e)
    })?;
    let name = event.event_name().to_string();
    trace!("💳️ Received {name} webhook");
    let Some(payment_event) = payment_event_from_webhook(event) else {
        debug!("💳️ Ignoring unsupported webhook event {name}");
        return Ok(HttpResponse::Ok().json(JsonResponse::success("ignored")));
    };
    let provenance = with_request_details(EventProvenance::webhook(), &req, &options);
    let outcome = api.apply(payment_event, provenance).await.map_err(|e| {
        error!("💳️ Could not settle {name} webhook. Paystack will retry. {e}");
        ServerError::from(e)
    })?;
    match &outcome {
        SettlementOutcome::Settled(_) | SettlementOutcome::Failed(_) => info!("💳️ {name} webhook: {outcome}"),
        SettlementOutcome::AmountMismatch { .. } => warn!("💳️ {name} webhook: {outcome}"),
        _ => debug!("💳️ {name} webhook: {outcome}"),
    }
    Ok(HttpResponse::Ok().json(JsonResponse::success(outcome.label())))
}
