use std::fmt::Display;

use serde::Serialize;
use spg_common::MinorUnits;

use crate::db_types::{Order, OrderReference};

pub const WEBHOOK_ACTOR: &str = "paystack-webhook";
pub const VERIFICATION_ACTOR: &str = "payment-verification";

/// Where a payment event came from. Recorded in the audit log alongside every settlement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventProvenance {
    pub actor: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl EventProvenance {
    pub fn new<S: Into<String>>(actor: S) -> Self {
        Self { actor: actor.into(), ip_address: None, user_agent: None }
    }

    pub fn webhook() -> Self {
        Self::new(WEBHOOK_ACTOR)
    }

    pub fn verification() -> Self {
        Self::new(VERIFICATION_ACTOR)
    }

    pub fn with_ip_address(mut self, ip: Option<String>) -> Self {
        self.ip_address = ip;
        self
    }

    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }
}

#[derive(Debug, Clone)]
pub enum SettlementOutcome {
    /// This event moved the order to `completed`.
    Settled(Order),
    /// This event moved the order to `failed`.
    Failed(Order),
    /// The order had already been settled. Nothing changed.
    Duplicate(Order),
    /// No order has this reference. Nothing changed.
    UnknownReference(OrderReference),
    /// A success event disagreed with the stored total or currency. The order was left untouched and flagged.
    AmountMismatch { order: Order, received: MinorUnits, received_currency: String },
}

impl SettlementOutcome {
    pub fn order(&self) -> Option<&Order> {
        match self {
            Self::Settled(o) | Self::Failed(o) | Self::Duplicate(o) => Some(o),
            Self::AmountMismatch { order, .. } => Some(order),
            Self::UnknownReference(_) => None,
        }
    }

    /// A short machine-readable label for responses and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Settled(_) => "completed",
            Self::Failed(_) => "failed",
            Self::Duplicate(_) => "duplicate",
            Self::UnknownReference(_) => "ignored",
            Self::AmountMismatch { .. } => "flagged",
        }
    }
}

impl Display for SettlementOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownReference(r) => write!(f, "ignored (unknown reference {r})"),
            other => match other.order() {
                Some(o) => write!(f, "{} ({})", other.label(), o.order_reference),
                None => write!(f, "{}", other.label()),
            },
        }
    }
}

/// Per-channel result of a notification fan-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "reason")]
pub enum ChannelResult {
    Delivered,
    /// Nothing to do on this channel, e.g. no registered devices.
    Skipped,
    Failed(String),
}

impl ChannelResult {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub push: ChannelResult,
    pub notification: ChannelResult,
    pub audit: ChannelResult,
}

impl DispatchReport {
    pub fn all_delivered(&self) -> bool {
        self.push.is_delivered() && self.notification.is_delivered() && self.audit.is_delivered()
    }
}
