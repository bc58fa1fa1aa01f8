use crate::domain::{requests::cart::AddToCartRequest, response::cart::CartResponse};
use async_trait::async_trait;
use shared::{domain::responses::ApiResponse, errors::ServiceError};
use std::sync::Arc;

pub type DynCartService = Arc<dyn CartServiceTrait + Send + Sync>;

#[async_trait]
pub trait CartServiceTrait {
    async fn get_cart(&self, user_id: i32) -> Result<CartResponse, ServiceError>;
    async fn add_to_cart(
        &self,
        user_id: i32,
        req: &AddToCartRequest,
    ) -> Result<ApiResponse<CartResponse>, ServiceError>;
    async fn remove_item(
        &self,
        user_id: i32,
        item_id: i32,
    ) -> Result<ApiResponse<()>, ServiceError>;
    async fn clear_cart(&self, user_id: i32) -> Result<ApiResponse<()>, ServiceError>;
}
