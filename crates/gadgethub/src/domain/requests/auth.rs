use serde::{Deserialize, Serialize};
use shared::model::UserRole;
use utoipa::ToSchema;
use validator::Validate;

/// The authenticated caller, resolved from the bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i32,
    pub email: String,
    pub role: UserRole,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCustomerRequest {
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    #[schema(example = "Nimal")]
    pub first_name: String,

    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    #[schema(example = "Perera")]
    pub last_name: String,

    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "nimal@example.com")]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    #[schema(example = "secret123")]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDistributorRequest {
    #[validate(length(min = 1, max = 100, message = "Full name is required"))]
    #[schema(example = "Kamal Silva")]
    pub full_name: String,

    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "sales@techlanka.lk")]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    #[validate(length(min = 1, max = 255, message = "Company name is required"))]
    #[schema(example = "TechLanka Distributors")]
    pub company_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAdminRequest {
    #[validate(length(min = 1, max = 100, message = "User name is required"))]
    #[schema(example = "admin")]
    pub user_name: String,

    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "admin@gadgethub.lk")]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "nimal@example.com")]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}
