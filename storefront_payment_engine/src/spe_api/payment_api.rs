use std::fmt::Debug;

use log::*;
use serde_json::json;

use crate::{
    db_types::{Order, OrderReference, PaymentEvent, PaymentStatus},
    helpers::whatsapp_contact_link,
    spe_api::{
        errors::PaymentInitiationError,
        payment_objects::{PaymentConfig, PaymentRequest, PaymentSession},
    },
    traits::{InitializePayment, MerchantManagement, OrderManagement, PaymentProvider, ProviderError, StoreError},
};

/// `PaymentApi` starts hosted-checkout payments for pending orders and asks the provider about their outcome.
///
/// It never changes order state. Settlement happens in [`crate::SettlementApi`].
pub struct PaymentApi<B, P> {
    db: B,
    provider: P,
    config: PaymentConfig,
}

impl<B, P> Debug for PaymentApi<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentApi({:?})", self.config)
    }
}

impl<B, P> PaymentApi<B, P>
where
    B: OrderManagement + MerchantManagement,
    P: PaymentProvider,
{
    pub fn new(db: B, provider: P, config: PaymentConfig) -> Self {
        Self { db, provider, config }
    }

    /// Starts a payment for a pending order.
    ///
    /// The requested amount must equal the stored order total. If the merchant has a subaccount, the configured split
    /// policy is attached. A provider failure leaves the order pending and is not retried.
    pub async fn initiate(&self, request: PaymentRequest) -> Result<PaymentSession, PaymentInitiationError> {
        let reference = &request.reference;
        if !request.email.contains('@') {
            return Err(PaymentInitiationError::Validation(format!("'{}' is not a valid email address", request.email)));
        }
        let order = self
            .db
            .fetch_order_by_reference(reference)
            .await?
            .ok_or_else(|| PaymentInitiationError::OrderNotFound(reference.clone()))?;
        if order.admin_id != request.admin_id {
            warn!("💳️ Payment for {reference} requested for store #{}, but it belongs to #{}", request.admin_id, order.admin_id);
            return Err(PaymentInitiationError::Validation(format!("Order {reference} does not belong to this store")));
        }
        if order.payment_status != PaymentStatus::Pending {
            return Err(PaymentInitiationError::NotPending {
                reference: reference.clone(),
                status: order.payment_status,
            });
        }
        if request.amount != order.total_amount {
            warn!(
                "💳️ Payment for {reference} requested with amount {}, but the order total is {}",
                request.amount, order.total_amount
            );
            return Err(PaymentInitiationError::AmountMismatch {
                expected: order.total_amount,
                provided: request.amount,
            });
        }
        let merchant = self
            .db
            .fetch_merchant(order.admin_id)
            .await?
            .ok_or(PaymentInitiationError::MerchantNotFound(order.admin_id))?;
        let split = self.config.split_policy.instruction_for(&order, &merchant);
        match &split {
            Some(s) => debug!("💳️ Splitting {reference} with {}. Platform keeps {}", s.subaccount, s.transaction_charge),
            None => debug!("💳️ Store #{} has no subaccount. {reference} will not be split", merchant.id),
        }
        let init = InitializePayment {
            reference: reference.clone(),
            email: request.email.clone(),
            amount: order.total_amount,
            currency: order.currency.clone(),
            callback_url: self.config.callback_url.clone(),
            split,
            metadata: Some(json!({
                "order_reference": reference,
                "admin_id": order.admin_id,
                "customer_name": request.customer_name,
                "customer_phone": request.customer_phone,
            })),
        };
        let authorization = tokio::time::timeout(self.config.provider_timeout, self.provider.initialize_transaction(init))
            .await
            .unwrap_or(Err(ProviderError::Timeout))
            .map_err(|e| {
                error!("💳️ Could not start payment for {reference}. {e}");
                e
            })?;
        info!("💳️ Payment for {reference} started. Customer is redirected to the hosted checkout");
        let message = format!(
            "Hello {}, this is {}. I have just placed order {reference} for {} {}.",
            merchant.business_name, request.customer_name, order.currency, order.total_amount
        );
        let redirect_url = merchant.phone.as_deref().and_then(|phone| whatsapp_contact_link(phone, &message));
        Ok(PaymentSession {
            authorization_url: authorization.authorization_url,
            access_code: authorization.access_code,
            reference: authorization.reference,
            redirect_url,
        })
    }

    pub async fn fetch_order(&self, reference: &OrderReference) -> Result<Option<Order>, StoreError> {
        self.db.fetch_order_by_reference(reference).await
    }

    /// Asks the provider for the final state of a payment. `None` means the provider has not settled it yet.
    pub async fn fetch_payment_event(&self, reference: &OrderReference) -> Result<Option<PaymentEvent>, ProviderError> {
        let result = tokio::time::timeout(self.config.provider_timeout, self.provider.verify_transaction(reference))
            .await
            .unwrap_or(Err(ProviderError::Timeout));
        match &result {
            Ok(Some(event)) => debug!("💳️ Provider reports {:?} for {reference}", event.kind),
            Ok(None) => debug!("💳️ Provider has not settled {reference} yet"),
            Err(e) => warn!("💳️ Could not verify {reference} with the provider. {e}"),
        }
        result
    }
}
