use mockall::mock;
use storefront_payment_engine::{
    db_types::{OrderReference, PaymentEvent},
    traits::{
        InitializePayment,
        PaymentAuthorization,
        PaymentProvider,
        ProviderError,
        PushError,
        PushMessage,
        PushNotifier,
    },
};

mock! {
    pub PaymentGateway {}
    impl PaymentProvider for PaymentGateway {
        async fn initialize_transaction(&self, request: InitializePayment) -> Result<PaymentAuthorization, ProviderError>;
        async fn verify_transaction(&self, reference: &OrderReference) -> Result<Option<PaymentEvent>, ProviderError>;
    }
}

mock! {
    pub PushService {}
    impl PushNotifier for PushService {
        async fn send(&self, tokens: &[String], message: &PushMessage) -> Result<(), PushError>;
    }
}
