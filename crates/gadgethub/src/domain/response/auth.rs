use serde::{Deserialize, Serialize};
use shared::model::UserRole;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub email: String,
    pub role: UserRole,
    pub first_name: String,
}
