use crate::{
    db_types::{Merchant, NewMerchant},
    traits::StoreError,
};

#[allow(async_fn_in_trait)]
pub trait MerchantManagement: Clone {
    async fn fetch_merchant(&self, merchant_id: i64) -> Result<Option<Merchant>, StoreError>;

    /// All push registration tokens for the merchant's devices. May be empty.
    async fn fetch_device_tokens(&self, merchant_id: i64) -> Result<Vec<String>, StoreError>;

    async fn insert_merchant(&self, merchant: NewMerchant) -> Result<Merchant, StoreError>;

    /// Registering the same token twice is a no-op.
    async fn register_device_token(&self, merchant_id: i64, token: &str) -> Result<(), StoreError>;

    async fn set_merchant_active(&self, merchant_id: i64, active: bool) -> Result<(), StoreError>;
}
