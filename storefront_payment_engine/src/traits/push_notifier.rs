use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum PushError {
    #[error("The push service rejected the message: {0}")]
    Rejected(String),
    #[error("Could not reach the push service: {0}")]
    Transport(String),
    #[error("The push service did not respond in time")]
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
}

impl PushMessage {
    pub fn new<S: Into<String>>(title: S, body: S) -> Self {
        Self { title: title.into(), body: body.into() }
    }
}

#[allow(async_fn_in_trait)]
pub trait PushNotifier {
    /// Delivers `message` to every token. An empty token list is not an error.
    async fn send(&self, tokens: &[String], message: &PushMessage) -> Result<(), PushError>;
}
