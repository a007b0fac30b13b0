use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::PaystackConfig,
    data_objects::{ApiResponse, InitializeTransaction, TransactionAuthorization, TransactionVerification},
    PaystackApiError,
};

#[derive(Clone)]
pub struct PaystackApi {
    config: PaystackConfig,
    client: Arc<Client>,
}

impl PaystackApi {
    pub fn new(config: PaystackConfig) -> Result<Self, PaystackApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let bearer = format!("Bearer {}", config.secret_key.reveal());
        let mut val = HeaderValue::from_str(&bearer).map_err(|e| PaystackApiError::Initialization(e.to_string()))?;
        val.set_sensitive(true);
        headers.insert(AUTHORIZATION, val);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| PaystackApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, PaystackApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {method} {url}");
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await?;
        let status = response.status();
        if status.is_success() {
            trace!("REST query successful. {status}");
            let envelope = response.json::<ApiResponse<T>>().await.map_err(|e| {
                if e.is_timeout() {
                    PaystackApiError::Timeout
                } else {
                    PaystackApiError::JsonError(e.to_string())
                }
            })?;
            match (envelope.status, envelope.data) {
                (true, Some(data)) => Ok(data),
                (true, None) => Err(PaystackApiError::JsonError(format!("Response had no data. {}", envelope.message))),
                (false, _) => Err(PaystackApiError::Rejected(envelope.message)),
            }
        } else {
            let message = response.text().await?;
            Err(PaystackApiError::QueryError { status: status.as_u16(), message })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    /// Creates a hosted-checkout session. The customer is redirected to `authorization_url` to pay.
    pub async fn initialize_transaction(
        &self,
        request: &InitializeTransaction,
    ) -> Result<TransactionAuthorization, PaystackApiError> {
        debug!("Initializing transaction {} for {}", request.reference, request.amount);
        let result = self
            .rest_query::<TransactionAuthorization, _>(Method::POST, "/transaction/initialize", Some(request))
            .await?;
        info!("Transaction {} initialized", result.reference);
        Ok(result)
    }

    /// Asks Paystack for the authoritative state of a transaction.
    pub async fn verify_transaction(&self, reference: &str) -> Result<TransactionVerification, PaystackApiError> {
        if reference.is_empty() || !reference.chars().all(|c| c.is_ascii_alphanumeric() || "-_.=".contains(c)) {
            return Err(PaystackApiError::Rejected(format!("'{reference}' is not a valid transaction reference")));
        }
        let path = format!("/transaction/verify/{reference}");
        debug!("Verifying transaction {reference}");
        let result = self.rest_query::<TransactionVerification, ()>(Method::GET, &path, None).await?;
        info!("Transaction {reference} has status {}", result.status);
        Ok(result)
    }
}
