use crate::domain::{
    requests::auth::{
        LoginRequest, RegisterAdminRequest, RegisterCustomerRequest, RegisterDistributorRequest,
    },
    response::{auth::LoginResponse, user::UserResponse},
};
use async_trait::async_trait;
use shared::{domain::responses::ApiResponse, errors::ServiceError};
use std::sync::Arc;

pub type DynAuthService = Arc<dyn AuthServiceTrait + Send + Sync>;

#[async_trait]
pub trait AuthServiceTrait {
    async fn register_customer(
        &self,
        req: &RegisterCustomerRequest,
    ) -> Result<ApiResponse<UserResponse>, ServiceError>;
    async fn register_distributor(
        &self,
        req: &RegisterDistributorRequest,
    ) -> Result<ApiResponse<UserResponse>, ServiceError>;
    async fn register_admin(
        &self,
        req: &RegisterAdminRequest,
    ) -> Result<ApiResponse<UserResponse>, ServiceError>;
    async fn login(&self, req: &LoginRequest) -> Result<LoginResponse, ServiceError>;
    async fn get_me(&self, user_id: i32) -> Result<UserResponse, ServiceError>;
}
