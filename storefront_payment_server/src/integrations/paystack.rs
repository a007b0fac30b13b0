use log::*;
use paystack_tools::{
    Bearer,
    ChargeData,
    InitializeTransaction,
    PaystackApi,
    PaystackApiError,
    PaystackConfig,
    PaystackWebhookEvent,
    TransactionStatus,
    TransactionVerification,
};
use storefront_payment_engine::{
    db_types::{OrderReference, PaymentEvent, PaymentEventKind},
    traits::{FeeBearer, InitializePayment, PaymentAuthorization, PaymentProvider, ProviderError},
};

/// [`PaymentProvider`] backed by the Paystack REST API.
#[derive(Clone)]
pub struct PaystackProvider {
    api: PaystackApi,
}

impl PaystackProvider {
    pub fn new(config: PaystackConfig) -> Result<Self, PaystackApiError> {
        let api = PaystackApi::new(config)?;
        Ok(Self { api })
    }
}

impl PaymentProvider for PaystackProvider {
    async fn initialize_transaction(&self, request: InitializePayment) -> Result<PaymentAuthorization, ProviderError> {
        let reference = request.reference.to_string();
        let mut tx = InitializeTransaction::new(request.email, request.amount, request.currency, reference);
        if let Some(url) = request.callback_url {
            tx = tx.with_callback_url(url);
        }
        if let Some(split) = request.split {
            let bearer = match split.bearer {
                FeeBearer::Account => Bearer::Account,
                FeeBearer::Subaccount => Bearer::Subaccount,
            };
            tx = tx.with_split(split.subaccount, split.transaction_charge, bearer);
        }
        if let Some(metadata) = request.metadata {
            tx = tx.with_metadata(metadata);
        }
        let auth = self.api.initialize_transaction(&tx).await.map_err(provider_error)?;
        Ok(PaymentAuthorization {
            authorization_url: auth.authorization_url,
            access_code: auth.access_code,
            reference: auth.reference,
        })
    }

    async fn verify_transaction(&self, reference: &OrderReference) -> Result<Option<PaymentEvent>, ProviderError> {
        let verification = self.api.verify_transaction(reference.as_str()).await.map_err(provider_error)?;
        Ok(payment_event_from_verification(verification))
    }
}

fn provider_error(e: PaystackApiError) -> ProviderError {
    match e {
        PaystackApiError::Timeout => ProviderError::Timeout,
        PaystackApiError::Rejected(s) => ProviderError::Rejected(s),
        PaystackApiError::QueryError { status, message } if status < 500 => {
            ProviderError::Rejected(format!("{status}: {message}"))
        },
        PaystackApiError::QueryError { status, message } => {
            ProviderError::Unavailable(format!("{status}: {message}"))
        },
        PaystackApiError::JsonError(s) | PaystackApiError::MalformedWebhook(s) => ProviderError::Malformed(s),
        PaystackApiError::Initialization(s) | PaystackApiError::RestResponseError(s) => ProviderError::Unavailable(s),
    }
}

/// `None` while the transaction is still in flight. Abandoned and reversed transactions count as failures.
pub fn payment_event_from_verification(v: TransactionVerification) -> Option<PaymentEvent> {
    let kind = match v.status {
        TransactionStatus::Success => PaymentEventKind::Success,
        TransactionStatus::Failed | TransactionStatus::Abandoned | TransactionStatus::Reversed => {
            PaymentEventKind::Failure
        },
        status => {
            debug!("💳️ Transaction {} is still {status}", v.reference);
            return None;
        },
    };
    Some(PaymentEvent {
        kind,
        reference: OrderReference::from(v.reference),
        amount: v.amount,
        currency: v.currency,
        customer_email: v.customer.email,
    })
}

/// The payment event carried by a webhook delivery, if it is one we settle on.
pub fn payment_event_from_webhook(event: PaystackWebhookEvent) -> Option<PaymentEvent> {
    let (kind, charge) = match event {
        PaystackWebhookEvent::ChargeSuccess(charge) => (PaymentEventKind::Success, charge),
        PaystackWebhookEvent::ChargeFailed(charge) => (PaymentEventKind::Failure, charge),
        PaystackWebhookEvent::Unsupported(_) => return None,
    };
    Some(charge_to_event(kind, charge))
}

fn charge_to_event(kind: PaymentEventKind, charge: ChargeData) -> PaymentEvent {
    PaymentEvent {
        kind,
        reference: OrderReference::from(charge.reference),
        amount: charge.amount,
        currency: charge.currency,
        customer_email: charge.customer.email,
    }
}
