use std::time::Duration;

use spg_common::Secret;

pub const DEFAULT_PAYSTACK_BASE_URL: &str = "https://api.paystack.co";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct PaystackConfig {
    /// Root of the REST API. Overridden in tests and for sandbox proxies.
    pub base_url: String,
    /// The server-side secret key (`sk_live_...`/`sk_test_...`). Never shipped to the browser.
    pub secret_key: Secret<String>,
    /// Upper bound for every call made to the API.
    pub timeout: Duration,
}

impl PaystackConfig {
    pub fn new(secret_key: Secret<String>) -> Self {
        Self { base_url: DEFAULT_PAYSTACK_BASE_URL.to_string(), secret_key, timeout: DEFAULT_TIMEOUT }
    }

    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
