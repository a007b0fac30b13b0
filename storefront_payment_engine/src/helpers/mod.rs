mod contact_link;
mod fees;
mod webhook_signature;

pub use contact_link::whatsapp_contact_link;
pub use fees::{FeeBreakdown, FeeSchedule, InvalidPriceError};
pub use webhook_signature::{WebhookVerifier, WebhookVerifierError};
