use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use spg_common::{major_units, MinorUnits};
use storefront_payment_engine::{
    db_types::{NewOrder, Order, OrderReference, PaymentStatus},
    payment_objects::PaymentRequest,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// `GET /api/fees?price=5000.00`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeeQuery {
    #[serde(with = "major_units")]
    pub price: MinorUnits,
}

/// Body of `POST /api/checkout`. Amounts are in major units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub admin_id: i64,
    #[serde(default)]
    pub customer_id: Option<i64>,
    pub customer_name: String,
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: String,
    pub order_details: Value,
    #[serde(with = "major_units")]
    pub total_amount: MinorUnits,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub verification_code: Option<String>,
}

impl CheckoutRequest {
    pub fn into_new_order(self, default_currency: &str) -> NewOrder {
        let currency = self.currency.map(|c| c.trim().to_ascii_uppercase()).unwrap_or_else(|| default_currency.into());
        NewOrder {
            admin_id: self.admin_id,
            customer_id: self.customer_id,
            customer_name: self.customer_name.trim().to_string(),
            customer_email: self.customer_email.trim().to_string(),
            customer_phone: self.customer_phone.trim().to_string(),
            order_details: self.order_details,
            total_amount: self.total_amount,
            currency,
            verification_code: self.verification_code,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutResponse {
    pub order: Order,
    pub order_reference: OrderReference,
}

/// Body of `POST /api/payments/initialize`. `order_id` is the order reference handed out at checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializePaymentRequest {
    pub order_id: String,
    pub email: String,
    #[serde(with = "major_units")]
    pub amount: MinorUnits,
    pub admin_id: i64,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: String,
}

impl From<InitializePaymentRequest> for PaymentRequest {
    fn from(value: InitializePaymentRequest) -> Self {
        PaymentRequest {
            reference: OrderReference::from(value.order_id.trim()),
            email: value.email.trim().to_string(),
            amount: value.amount,
            admin_id: value.admin_id,
            customer_name: value.customer_name,
            customer_phone: value.customer_phone,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyPaymentRequest {
    pub reference: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyPaymentResponse {
    pub reference: String,
    pub payment_status: PaymentStatus,
    /// `completed`, `failed`, `duplicate` or `pending`
    pub outcome: String,
}
