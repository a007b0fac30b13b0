//! HMAC middleware for Actix Web.
//!
//! Paystack signs every webhook delivery with HMAC-SHA512 over the raw request body, keyed with the account's webhook
//! secret, and sends the hex digest in the `x-paystack-signature` header.
//!
//! Wrap the webhook scope with this middleware. Requests without a valid signature are answered with a 401 and never
//! reach the handler. Verified requests get their body restored so the handler can read it again.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_http::h1;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    web,
    Error,
};
use futures::future::LocalBoxFuture;
use log::{trace, warn};
use storefront_payment_engine::helpers::WebhookVerifier;

use crate::{errors::ServerError, helpers::get_remote_ip};

pub struct HmacMiddlewareFactory {
    signature_header: String,
    verifier: WebhookVerifier,
}

impl HmacMiddlewareFactory {
    pub fn new(signature_header: &str, verifier: WebhookVerifier) -> Self {
        HmacMiddlewareFactory { signature_header: signature_header.to_ascii_lowercase(), verifier }
    }
}

impl<S, B> Transform<S, ServiceRequest> for HmacMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = HmacMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(HmacMiddlewareService {
            signature_header: self.signature_header.clone(),
            verifier: self.verifier.clone(),
            service: Rc::new(service),
        }))
    }
}

pub struct HmacMiddlewareService<S> {
    signature_header: String,
    verifier: WebhookVerifier,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for HmacMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let verifier = self.verifier.clone();
        let signature_header = self.signature_header.clone();
        Box::pin(async move {
            trace!("🔐️ Checking webhook signature for request");
            let data = req.extract::<web::Bytes>().await.map_err(|e| {
                warn!("🔐️ Failed to extract request data: {:?}", e);
                ServerError::InvalidRequestBody("Failed to extract request data.".into())
            })?;
            let peer = get_remote_ip(req.request(), false, false).map(|ip| ip.to_string()).unwrap_or_default();
            let signature = req.headers().get(&signature_header).and_then(|v| v.to_str().ok()).ok_or_else(|| {
                warn!("🔐️ No webhook signature found in request from {peer}. Denying access.");
                ServerError::InvalidSignature
            })?;
            if verifier.verify(data.as_ref(), signature) {
                trace!("🔐️ Webhook signature check for request ✅️");
                req.set_payload(bytes_to_payload(data));
                service.call(req).await
            } else {
                warn!("🔐️ Invalid webhook signature found in request from {peer}. Denying access.");
                Err(ServerError::InvalidSignature.into())
            }
        })
    }
}

fn bytes_to_payload(buf: web::Bytes) -> Payload {
    let (_, mut pl) = h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}
