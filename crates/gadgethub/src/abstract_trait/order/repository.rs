use crate::{
    domain::requests::order::CheckoutRecord,
    model::{order::Order, order_item::OrderItem},
};
use async_trait::async_trait;
use shared::errors::RepositoryError;
use std::sync::Arc;

pub type DynOrderQueryRepository = Arc<dyn OrderQueryRepositoryTrait + Send + Sync>;
pub type DynOrderCommandRepository = Arc<dyn OrderCommandRepositoryTrait + Send + Sync>;

#[async_trait]
pub trait OrderQueryRepositoryTrait {
    async fn find_all(&self) -> Result<Vec<Order>, RepositoryError>;
    async fn find_by_customer(&self, customer_id: i32) -> Result<Vec<Order>, RepositoryError>;
    async fn find_by_id(&self, id: i32) -> Result<Option<Order>, RepositoryError>;
    async fn find_items(&self, order_ids: &[i32]) -> Result<Vec<OrderItem>, RepositoryError>;
}

#[async_trait]
pub trait OrderCommandRepositoryTrait {
    /// Converts an Approved quotation into an order: marks it ConvertedToOrder,
    /// snapshots its items and decrements stock, or changes nothing.
    async fn checkout(&self, req: &CheckoutRecord) -> Result<Order, RepositoryError>;
    async fn update_status(&self, id: i32, status: &str) -> Result<Order, RepositoryError>;
    async fn delete_order(&self, id: i32) -> Result<(), RepositoryError>;
}
