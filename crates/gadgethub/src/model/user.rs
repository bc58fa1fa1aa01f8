use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use shared::model::UserRole;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
    pub company_name: Option<String>,
    pub created_at: NaiveDateTime,
}
