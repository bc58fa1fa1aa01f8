use crate::domain::{
    requests::{auth::AuthUser, order::UpdateOrderStatusRequest},
    response::order::{OrderCreatedResponse, OrderResponse},
};
use async_trait::async_trait;
use shared::{domain::responses::ApiResponse, errors::ServiceError};
use std::sync::Arc;

pub type DynOrderQueryService = Arc<dyn OrderQueryServiceTrait + Send + Sync>;
pub type DynOrderCommandService = Arc<dyn OrderCommandServiceTrait + Send + Sync>;

#[async_trait]
pub trait OrderQueryServiceTrait {
    async fn find_all(&self) -> Result<Vec<OrderResponse>, ServiceError>;
    async fn my_orders(&self, customer_id: i32) -> Result<Vec<OrderResponse>, ServiceError>;
    async fn find_by_id(&self, caller: &AuthUser, id: i32)
    -> Result<OrderResponse, ServiceError>;
}

#[async_trait]
pub trait OrderCommandServiceTrait {
    async fn checkout(
        &self,
        caller: &AuthUser,
        quotation_id: i32,
    ) -> Result<ApiResponse<OrderCreatedResponse>, ServiceError>;
    async fn update_status(
        &self,
        id: i32,
        req: &UpdateOrderStatusRequest,
    ) -> Result<ApiResponse<OrderResponse>, ServiceError>;
    async fn delete_order(&self, id: i32) -> Result<ApiResponse<()>, ServiceError>;
}
