pub mod checkout_api;
pub mod errors;
pub mod notification_dispatcher;
pub mod payment_api;
pub mod payment_objects;
pub mod settlement_api;
pub mod settlement_objects;
