//! # Backend contracts
//!
//! The settlement pipeline never talks to a database, payment provider or push service directly. Instead, each
//! concern is described by a trait here, and concrete implementations are injected into the API structs.
//!
//! * [`OrderManagement`] creates orders and performs the single guarded payment-status transition.
//! * [`MerchantManagement`] reads store owners and their push registration tokens.
//! * [`NotificationManagement`] persists in-app notifications and the append-only audit log.
//! * [`PaymentProvider`] starts hosted-checkout transactions and verifies them by reference.
//! * [`PushNotifier`] delivers push messages to device tokens.
//!
//! [`StorefrontDatabase`] bundles the three persistence traits.
mod data_objects;
mod merchant_management;
mod notification_management;
mod order_management;
mod payment_provider;
mod push_notifier;

pub use data_objects::{StoreError, TransitionOutcome};
pub use merchant_management::MerchantManagement;
pub use notification_management::NotificationManagement;
pub use order_management::{OrderManagement, MAX_REFERENCE_ATTEMPTS};
pub use payment_provider::{FeeBearer, InitializePayment, PaymentAuthorization, PaymentProvider, ProviderError, SplitInstruction};
pub use push_notifier::{PushError, PushMessage, PushNotifier};

/// Everything the settlement pipeline needs from a persistence backend.
pub trait StorefrontDatabase: OrderManagement + MerchantManagement + NotificationManagement {}

impl<T> StorefrontDatabase for T where T: OrderManagement + MerchantManagement + NotificationManagement {}
