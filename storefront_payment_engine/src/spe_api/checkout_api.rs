use std::fmt::Debug;

use log::*;
use spg_common::MinorUnits;

use crate::{
    db_types::{NewOrder, Order, OrderLine},
    spe_api::errors::CheckoutError,
    traits::{MerchantManagement, OrderManagement},
};

pub const DEFAULT_REFERENCE_PREFIX: &str = "SHOP";

/// `CheckoutApi` turns a validated cart into a pending order.
pub struct CheckoutApi<B> {
    db: B,
    reference_prefix: String,
}

impl<B> Debug for CheckoutApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckoutApi({})", self.reference_prefix)
    }
}

impl<B> CheckoutApi<B>
where B: OrderManagement + MerchantManagement
{
    pub fn new(db: B) -> Self {
        Self { db, reference_prefix: DEFAULT_REFERENCE_PREFIX.to_string() }
    }

    pub fn with_reference_prefix(mut self, prefix: &str) -> Self {
        self.reference_prefix = prefix.to_string();
        self
    }

    /// Creates a `pending` order for the given store. The store must exist and be active. The line-item pricing
    /// snapshot in `order_details` is stored as-is; fees are not recomputed here.
    pub async fn create_order(&self, order: NewOrder) -> Result<Order, CheckoutError> {
        validate(&order)?;
        let merchant = self
            .db
            .fetch_merchant(order.admin_id)
            .await?
            .ok_or(CheckoutError::MerchantNotFound(order.admin_id))?;
        if !merchant.is_active {
            info!("🛒️ Checkout refused. Store #{} ({}) is inactive", merchant.id, merchant.business_name);
            return Err(CheckoutError::StoreInactive(merchant.id));
        }
        let order = self.db.insert_order(order, &self.reference_prefix).await?;
        info!(
            "🛒️ Order {} created for store #{} ({} {})",
            order.order_reference, order.admin_id, order.currency, order.total_amount
        );
        Ok(order)
    }
}

fn validate(order: &NewOrder) -> Result<(), CheckoutError> {
    if order.customer_name.trim().is_empty() {
        return Err(CheckoutError::Validation("customer_name is required".into()));
    }
    let email = order.customer_email.trim();
    match email.split_once('@') {
        Some((user, domain)) if !user.is_empty() && domain.contains('.') => {},
        _ => return Err(CheckoutError::Validation(format!("'{email}' is not a valid email address"))),
    }
    if order.customer_phone.trim().is_empty() {
        return Err(CheckoutError::Validation("customer_phone is required".into()));
    }
    if !order.total_amount.is_positive() {
        return Err(CheckoutError::Validation(format!("total_amount must be positive, not {}", order.total_amount)));
    }
    if order.currency.len() != 3 || !order.currency.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(CheckoutError::Validation(format!("'{}' is not an ISO currency code", order.currency)));
    }
    match order.order_details.as_array() {
        Some(lines) if !lines.is_empty() => {},
        _ => return Err(CheckoutError::Validation("order_details must be a non-empty list of items".into())),
    }
    // Lines that carry a pricing snapshot must be consistent with it and with the order total. Other payloads are
    // stored as-is and settle with a percentage split.
    let Ok(lines) = serde_json::from_value::<Vec<OrderLine>>(order.order_details.clone()) else {
        debug!("🛒️ order_details carry no pricing snapshot. Storing them as-is");
        return Ok(());
    };
    let mut total = MinorUnits::default();
    for line in &lines {
        line.check().map_err(CheckoutError::Validation)?;
        let expected = line.price.checked_add(line.paystack_fee).and_then(|p| p.checked_add(line.superadmin_fee));
        if expected != Some(line.adjusted_price) {
            return Err(CheckoutError::Validation(format!(
                "'{}' has an adjusted price of {}, but its price and fees add up to something else",
                line.name, line.adjusted_price
            )));
        }
        total = line
            .line_total()
            .and_then(|t| total.checked_add(t))
            .ok_or_else(|| CheckoutError::Validation("order_details add up to more than can be charged".into()))?;
    }
    if total != order.total_amount {
        return Err(CheckoutError::Validation(format!(
            "total_amount {} does not match the order lines, which add up to {total}",
            order.total_amount
        )));
    }
    Ok(())
}
