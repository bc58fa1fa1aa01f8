use crate::domain::{
    requests::{auth::AuthUser, quotation::QuotationItemUpdateRequest},
    response::quotation::{QuotationCreatedResponse, QuotationResponse},
};
use async_trait::async_trait;
use shared::{domain::responses::ApiResponse, errors::ServiceError};
use std::sync::Arc;

pub type DynQuotationQueryService = Arc<dyn QuotationQueryServiceTrait + Send + Sync>;
pub type DynQuotationCommandService = Arc<dyn QuotationCommandServiceTrait + Send + Sync>;

#[async_trait]
pub trait QuotationQueryServiceTrait {
    async fn my_quotations(
        &self,
        customer_id: i32,
    ) -> Result<Vec<QuotationResponse>, ServiceError>;
    async fn pending_requests(
        &self,
        caller: &AuthUser,
    ) -> Result<Vec<QuotationResponse>, ServiceError>;
    async fn find_by_id(
        &self,
        caller: &AuthUser,
        id: i32,
    ) -> Result<QuotationResponse, ServiceError>;
}

#[async_trait]
pub trait QuotationCommandServiceTrait {
    async fn request_from_cart(
        &self,
        caller: &AuthUser,
    ) -> Result<ApiResponse<QuotationCreatedResponse>, ServiceError>;
    async fn approve(
        &self,
        caller: &AuthUser,
        id: i32,
        updates: &[QuotationItemUpdateRequest],
    ) -> Result<ApiResponse<QuotationResponse>, ServiceError>;
    async fn reject(
        &self,
        caller: &AuthUser,
        id: i32,
    ) -> Result<ApiResponse<QuotationResponse>, ServiceError>;
}
