use crate::{
    domain::requests::quotation::{ApproveQuotationRecord, CreateQuotationRecord},
    model::{quotation::Quotation, quotation_item::QuotationItem},
};
use async_trait::async_trait;
use shared::errors::RepositoryError;
use std::sync::Arc;

pub type DynQuotationQueryRepository = Arc<dyn QuotationQueryRepositoryTrait + Send + Sync>;
pub type DynQuotationCommandRepository = Arc<dyn QuotationCommandRepositoryTrait + Send + Sync>;

#[async_trait]
pub trait QuotationQueryRepositoryTrait {
    async fn find_by_id(&self, id: i32) -> Result<Option<Quotation>, RepositoryError>;
    async fn find_by_customer(&self, customer_id: i32) -> Result<Vec<Quotation>, RepositoryError>;
    /// Pending quotations, restricted to one distributor when `distributor_id` is set.
    async fn find_pending(
        &self,
        distributor_id: Option<i32>,
    ) -> Result<Vec<Quotation>, RepositoryError>;
    async fn find_items(&self, quotation_ids: &[i32])
    -> Result<Vec<QuotationItem>, RepositoryError>;
}

#[async_trait]
pub trait QuotationCommandRepositoryTrait {
    /// Moves the customer's cart into a new Pending quotation and empties the cart,
    /// all in one transaction.
    async fn create_from_cart(
        &self,
        req: &CreateQuotationRecord,
    ) -> Result<Quotation, RepositoryError>;
    /// Applies negotiated prices and flips Pending to Approved in one transaction.
    async fn approve(&self, req: &ApproveQuotationRecord) -> Result<Quotation, RepositoryError>;
    async fn reject(&self, id: i32) -> Result<Quotation, RepositoryError>;
}
