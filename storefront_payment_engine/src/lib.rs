//! Storefront Payment Engine
//!
//! The engine owns the payment and settlement pipeline of a multi-tenant storefront: pricing products, turning carts
//! into orders, starting hosted-checkout payments, and settling orders from provider events exactly once.
//! It is provider-agnostic.
//!
//! The library is divided into these sections:
//! 1. Backend contracts ([`mod@traits`]). Persistence, the payment provider and the push service are all described
//!    by traits, and concrete clients are injected. [`SqliteDatabase`] is the bundled persistence backend.
//! 2. The public API ([`CheckoutApi`], [`PaymentApi`], [`SettlementApi`], [`NotificationDispatcher`]).
//! 3. Pure helpers ([`mod@helpers`]): the fee calculator, webhook signature verification and contact links.
pub mod db_types;
pub mod helpers;
mod spe_api;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteDatabase, SqliteDatabaseError};
pub use spe_api::{
    checkout_api::{CheckoutApi, DEFAULT_REFERENCE_PREFIX},
    errors::{CheckoutError, PaymentInitiationError, SettlementError},
    notification_dispatcher::{NotificationDispatcher, DEFAULT_PUSH_TIMEOUT, ORDER_RESOURCE},
    payment_api::PaymentApi,
    payment_objects,
    settlement_api::SettlementApi,
    settlement_objects,
};
