//! A small client for the subset of the Paystack REST API the storefront uses: initialising a hosted-checkout
//! transaction (optionally split with a merchant subaccount), verifying a transaction by reference, and decoding
//! webhook deliveries.
mod api;
mod config;
mod error;

mod data_objects;
mod webhook;

pub use api::PaystackApi;
pub use config::{PaystackConfig, DEFAULT_PAYSTACK_BASE_URL};
pub use data_objects::{
    Bearer,
    Customer,
    InitializeTransaction,
    TransactionAuthorization,
    TransactionStatus,
    TransactionVerification,
};
pub use error::PaystackApiError;
pub use webhook::{ChargeData, PaystackWebhookEvent, PAYSTACK_SIGNATURE_HEADER};
