pub mod fcm;
pub mod paystack;

pub use fcm::FcmNotifier;
pub use paystack::PaystackProvider;
