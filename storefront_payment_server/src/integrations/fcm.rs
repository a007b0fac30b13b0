//! Push delivery through Firebase Cloud Messaging's HTTP endpoint.
use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client,
};
use serde::{Deserialize, Serialize};
use spg_common::Secret;
use storefront_payment_engine::traits::{PushError, PushMessage, PushNotifier};

pub const DEFAULT_FCM_URL: &str = "https://fcm.googleapis.com/fcm/send";

#[derive(Debug, Clone, Serialize)]
struct FcmRequest<'a> {
    registration_ids: &'a [String],
    notification: &'a PushMessage,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FcmResponse {
    #[serde(default)]
    success: usize,
    #[serde(default)]
    failure: usize,
}

#[derive(Clone)]
pub struct FcmNotifier {
    url: String,
    client: Arc<Client>,
}

impl FcmNotifier {
    pub fn new(url: &str, server_key: &Secret<String>, timeout: Duration) -> Result<Self, PushError> {
        let mut headers = HeaderMap::with_capacity(2);
        let key = format!("key={}", server_key.reveal());
        let mut val = HeaderValue::from_str(&key).map_err(|e| PushError::Rejected(e.to_string()))?;
        val.set_sensitive(true);
        headers.insert(AUTHORIZATION, val);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| PushError::Transport(e.to_string()))?;
        Ok(Self { url: url.to_string(), client: Arc::new(client) })
    }
}

impl PushNotifier for FcmNotifier {
    async fn send(&self, tokens: &[String], message: &PushMessage) -> Result<(), PushError> {
        if tokens.is_empty() {
            return Ok(());
        }
        let body = FcmRequest { registration_ids: tokens, notification: message };
        trace!("📣️ Sending push '{}' to {} devices", message.title, tokens.len());
        let response = self.client.post(&self.url).json(&body).send().await.map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(PushError::Rejected(format!("{status}: {text}")));
        }
        let result = response.json::<FcmResponse>().await.unwrap_or_default();
        if result.success == 0 && result.failure > 0 {
            return Err(PushError::Rejected(format!("All {} device tokens were rejected", result.failure)));
        }
        debug!("📣️ Push delivered. {} succeeded, {} failed", result.success, result.failure);
        Ok(())
    }
}

fn transport_error(e: reqwest::Error) -> PushError {
    if e.is_timeout() {
        PushError::Timeout
    } else {
        PushError::Transport(e.to_string())
    }
}
