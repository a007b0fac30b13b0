use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::*;
use rand::{distributions::Uniform, Rng};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use spg_common::{major_units, MinorUnits, DEFAULT_CURRENCY_CODE};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(String);

//--------------------------------------    OrderReference     ---------------------------------------------------------
const REFERENCE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const REFERENCE_SUFFIX_LEN: usize = 6;

/// The externally visible order identifier, also used as the payment provider's transaction reference.
/// Format: `PREFIX-<unix-millis>-<RANDOM6>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderReference(String);

impl OrderReference {
    pub fn generate(prefix: &str) -> Self {
        Self::generate_at(prefix, Utc::now())
    }

    pub fn generate_at(prefix: &str, now: DateTime<Utc>) -> Self {
        let dist = Uniform::from(0..REFERENCE_ALPHABET.len());
        let suffix: String = rand::thread_rng()
            .sample_iter(dist)
            .take(REFERENCE_SUFFIX_LEN)
            .map(|i| REFERENCE_ALPHABET[i] as char)
            .collect();
        Self(format!("{prefix}-{}-{suffix}", now.timestamp_millis()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for OrderReference {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderReference {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

//--------------------------------------    PaymentStatus      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Created at checkout. The only state a settlement can move out of.
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    /// Completed and failed are sinks.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------    TrackingStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TrackingStatus {
    #[default]
    Processing,
    Shipped,
    OutForDelivery,
    Delivered,
    Cancelled,
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: i64,
    pub order_reference: OrderReference,
    pub admin_id: i64,
    /// `None` for guest checkouts
    pub customer_id: Option<i64>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    /// Line items as sent by the storefront. Stored verbatim.
    #[sqlx(json)]
    pub order_details: Value,
    #[serde(with = "major_units")]
    pub total_amount: MinorUnits,
    pub currency: String,
    pub payment_status: PaymentStatus,
    pub payment_date: Option<DateTime<Utc>>,
    pub tracking_status: TrackingStatus,
    pub verification_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Decodes `order_details` into priced lines. Fails if the payload does not carry the fee snapshot.
    pub fn line_items(&self) -> Result<Vec<OrderLine>, serde_json::Error> {
        serde_json::from_value(self.order_details.clone())
    }
}

//--------------------------------------       OrderLine       ---------------------------------------------------------
/// One line of an order, carrying the pricing snapshot computed when the product was saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    #[serde(default)]
    pub product_id: Option<i64>,
    pub name: String,
    pub quantity: i64,
    #[serde(with = "major_units")]
    pub price: MinorUnits,
    #[serde(with = "major_units")]
    pub paystack_fee: MinorUnits,
    #[serde(with = "major_units")]
    pub superadmin_fee: MinorUnits,
    #[serde(with = "major_units")]
    pub adjusted_price: MinorUnits,
}

impl OrderLine {
    /// The quantity must be positive and no amount may be negative.
    pub fn check(&self) -> Result<(), String> {
        if self.quantity <= 0 {
            return Err(format!("'{}' has a quantity of {}", self.name, self.quantity));
        }
        let amounts = [self.price, self.paystack_fee, self.superadmin_fee, self.adjusted_price];
        if amounts.iter().any(|a| a.value() < 0) {
            return Err(format!("'{}' has a negative price or fee", self.name));
        }
        Ok(())
    }

    /// `adjusted_price * quantity`. `None` if the line fails [`OrderLine::check`] or the total overflows.
    pub fn line_total(&self) -> Option<MinorUnits> {
        self.check().ok()?;
        self.adjusted_price.checked_mul(self.quantity)
    }

    /// `(paystack_fee + superadmin_fee) * quantity`. `None` if the line fails [`OrderLine::check`] or the sum
    /// overflows.
    pub fn line_fees(&self) -> Option<MinorUnits> {
        self.check().ok()?;
        self.paystack_fee.checked_add(self.superadmin_fee)?.checked_mul(self.quantity)
    }
}

//--------------------------------------       NewOrder        ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub admin_id: i64,
    pub customer_id: Option<i64>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub order_details: Value,
    pub total_amount: MinorUnits,
    pub currency: String,
    pub verification_code: Option<String>,
}

impl NewOrder {
    pub fn new(admin_id: i64, customer_name: &str, customer_email: &str, total_amount: MinorUnits) -> Self {
        Self {
            admin_id,
            customer_id: None,
            customer_name: customer_name.to_string(),
            customer_email: customer_email.to_string(),
            customer_phone: String::default(),
            order_details: Value::Array(vec![]),
            total_amount,
            currency: DEFAULT_CURRENCY_CODE.to_string(),
            verification_code: None,
        }
    }

    pub fn with_phone(mut self, phone: &str) -> Self {
        self.customer_phone = phone.to_string();
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.order_details = details;
        self
    }

    pub fn with_currency(mut self, currency: &str) -> Self {
        self.currency = currency.to_string();
        self
    }
}

//--------------------------------------       Merchant        ---------------------------------------------------------
/// A store owner ("admin"). Settlement notifications are addressed to this user.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Merchant {
    pub id: i64,
    pub business_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub account_number: Option<String>,
    pub bank_code: Option<String>,
    /// The provider subaccount that receives the merchant's share of split payments
    pub subaccount_code: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NewMerchant {
    pub business_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub account_number: Option<String>,
    pub bank_code: Option<String>,
    pub subaccount_code: Option<String>,
}

//--------------------------------------     Notification      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    OrderPaid,
    OrderFailed,
    PaymentFlagged,
}

impl Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OrderPaid => write!(f, "order_paid"),
            Self::OrderFailed => write!(f, "order_failed"),
            Self::PaymentFlagged => write!(f, "payment_flagged"),
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: i64,
    pub recipient_id: i64,
    pub message: String,
    pub notification_type: NotificationType,
    pub timestamp: DateTime<Utc>,
    pub is_read: bool,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient_id: i64,
    pub message: String,
    pub notification_type: NotificationType,
}

//--------------------------------------     AuditLogEntry     ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditLogEntry {
    pub id: i64,
    pub actor: String,
    pub action: String,
    pub resource_type: String,
    pub resource_id: String,
    /// JSON text
    pub before_state: Option<String>,
    /// JSON text
    pub after_state: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuditLogEntry {
    pub fn after_state_json(&self) -> Option<Value> {
        self.after_state.as_deref().and_then(|s| {
            serde_json::from_str(s)
                .map_err(|e| warn!("Audit log #{} has an invalid after_state: {e}", self.id))
                .ok()
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewAuditLogEntry {
    pub actor: String,
    pub action: String,
    pub resource_type: String,
    pub resource_id: String,
    pub before_state: Option<Value>,
    pub after_state: Option<Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

//--------------------------------------     PaymentEvent      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentEventKind {
    Success,
    Failure,
}

impl PaymentEventKind {
    pub fn target_status(&self) -> PaymentStatus {
        match self {
            Self::Success => PaymentStatus::Completed,
            Self::Failure => PaymentStatus::Failed,
        }
    }
}

/// A provider's claim about the outcome of a payment, from a verified webhook or a verify-by-reference call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentEvent {
    pub kind: PaymentEventKind,
    pub reference: OrderReference,
    pub amount: MinorUnits,
    pub currency: String,
    pub customer_email: String,
}
