use crate::model::cart_item::{CartItem, CartLine};
use async_trait::async_trait;
use shared::errors::RepositoryError;
use std::sync::Arc;

pub type DynCartRepository = Arc<dyn CartRepositoryTrait + Send + Sync>;

#[async_trait]
pub trait CartRepositoryTrait {
    async fn find_by_user(&self, user_id: i32) -> Result<Vec<CartLine>, RepositoryError>;
    async fn find_item(
        &self,
        user_id: i32,
        product_id: i32,
    ) -> Result<Option<CartItem>, RepositoryError>;
    /// Inserts the row or adds `quantity` to the existing (user, product) row.
    async fn add_quantity(
        &self,
        user_id: i32,
        product_id: i32,
        quantity: i32,
    ) -> Result<CartItem, RepositoryError>;
    /// Returns false when no row owned by `user_id` matched.
    async fn remove_item(&self, user_id: i32, item_id: i32) -> Result<bool, RepositoryError>;
    async fn clear(&self, user_id: i32) -> Result<u64, RepositoryError>;
}
