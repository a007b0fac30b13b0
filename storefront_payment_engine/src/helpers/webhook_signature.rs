//! # Webhook authenticity
//!
//! The payment provider signs every webhook delivery with HMAC-SHA512 over the raw request body, keyed with the
//! account's secret, and sends the lowercase hex digest in a header. A delivery is only trusted if the digest we
//! compute over the exact bytes received matches the header.
use hmac::{Hmac, Mac};
use sha2::Sha512;
use spg_common::Secret;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha512 = Hmac<Sha512>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookVerifierError {
    #[error("No webhook secret has been configured")]
    MissingSecret,
    #[error("The webhook secret cannot be used as an HMAC key")]
    InvalidKey,
}

#[derive(Clone)]
pub struct WebhookVerifier {
    secret: Secret<String>,
}

impl WebhookVerifier {
    /// Fails if the secret is blank. There is no mode in which unsigned deliveries are accepted.
    pub fn new(secret: Secret<String>) -> Result<Self, WebhookVerifierError> {
        if secret.is_blank() {
            return Err(WebhookVerifierError::MissingSecret);
        }
        HmacSha512::new_from_slice(secret.reveal().as_bytes()).map_err(|_| WebhookVerifierError::InvalidKey)?;
        Ok(Self { secret })
    }

    /// The lowercase hex HMAC-SHA512 of `body`.
    pub fn sign(&self, body: &[u8]) -> String {
        // HMAC accepts keys of any length, so this never fails in practice
        let mut mac = match HmacSha512::new_from_slice(self.secret.reveal().as_bytes()) {
            Ok(mac) => mac,
            Err(_) => return String::default(),
        };
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    /// True only if `signature` is exactly the hex digest of `body`. Comparison is constant-time; a length mismatch
    /// fails early since digest length is public.
    pub fn verify(&self, body: &[u8], signature: &str) -> bool {
        let expected = self.sign(body);
        let provided = signature.trim().to_ascii_lowercase();
        if expected.is_empty() || expected.len() != provided.len() {
            return false;
        }
        expected.as_bytes().ct_eq(provided.as_bytes()).into()
    }
}
