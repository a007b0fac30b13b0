use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use paystack_tools::PaystackApiError;
use storefront_payment_engine::{
    helpers::InvalidPriceError,
    traits::{ProviderError, StoreError},
    CheckoutError,
    PaymentInitiationError,
    SettlementError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Invalid request. {0}")]
    ValidationError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Webhook signature is missing or invalid.")]
    InvalidSignature,
    #[error("Access denied. {0}")]
    Forbidden(String),
    #[error("Store is not accepting orders. {0}")]
    StoreInactive(String),
    #[error("Order not found. {0}")]
    OrderNotFound(String),
    #[error("Merchant not found. {0}")]
    MerchantNotFound(String),
    #[error("Payment could not be started. {0}")]
    PaymentNotStarted(String),
    #[error("Payment failed. {0}")]
    PaymentFailed(String),
    #[error("Payment could not be confirmed, please try again. {0}")]
    PaymentUnconfirmed(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidSignature => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::StoreInactive(_) => StatusCode::FORBIDDEN,
            Self::OrderNotFound(_) => StatusCode::NOT_FOUND,
            Self::MerchantNotFound(_) => StatusCode::NOT_FOUND,
            Self::PaymentNotStarted(_) => StatusCode::BAD_GATEWAY,
            Self::PaymentFailed(_) => StatusCode::PAYMENT_REQUIRED,
            Self::PaymentUnconfirmed(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<CheckoutError> for ServerError {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::Validation(s) => Self::ValidationError(s),
            CheckoutError::MerchantNotFound(id) => Self::MerchantNotFound(format!("No store with id {id}")),
            CheckoutError::StoreInactive(id) => Self::StoreInactive(format!("Store {id} is inactive")),
            CheckoutError::DatabaseError(e) => {
                error!("💻️ Checkout failed with a database error. {e}");
                Self::BackendError(e.to_string())
            },
        }
    }
}

impl From<PaymentInitiationError> for ServerError {
    fn from(e: PaymentInitiationError) -> Self {
        match e {
            PaymentInitiationError::Validation(s) => Self::ValidationError(s),
            PaymentInitiationError::OrderNotFound(r) => Self::OrderNotFound(r.to_string()),
            e @ PaymentInitiationError::NotPending { .. } => Self::ValidationError(e.to_string()),
            e @ PaymentInitiationError::AmountMismatch { .. } => Self::ValidationError(e.to_string()),
            PaymentInitiationError::MerchantNotFound(id) => Self::MerchantNotFound(format!("No store with id {id}")),
            PaymentInitiationError::Provider(e) => Self::PaymentNotStarted(e.to_string()),
            PaymentInitiationError::DatabaseError(e) => {
                error!("💻️ Payment initiation failed with a database error. {e}");
                Self::BackendError(e.to_string())
            },
        }
    }
}

impl From<SettlementError> for ServerError {
    fn from(e: SettlementError) -> Self {
        Self::BackendError(e.to_string())
    }
}

impl From<StoreError> for ServerError {
    fn from(e: StoreError) -> Self {
        error!("💻️ Database error. {e}");
        Self::BackendError(e.to_string())
    }
}

impl From<ProviderError> for ServerError {
    fn from(e: ProviderError) -> Self {
        Self::PaymentUnconfirmed(e.to_string())
    }
}

impl From<InvalidPriceError> for ServerError {
    fn from(e: InvalidPriceError) -> Self {
        Self::ValidationError(e.to_string())
    }
}

impl From<PaystackApiError> for ServerError {
    fn from(e: PaystackApiError) -> Self {
        match e {
            PaystackApiError::MalformedWebhook(s) => Self::InvalidRequestBody(s),
            e => Self::BackendError(e.to_string()),
        }
    }
}
