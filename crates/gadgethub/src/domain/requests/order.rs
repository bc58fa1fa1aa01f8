use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Accepts either a bare JSON string (`"Shipped"`) or `{"status": "Shipped"}`.
/// The value is trimmed before validation.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(from = "StatusBody")]
pub struct UpdateOrderStatusRequest {
    #[validate(length(min = 1, max = 50, message = "Status must be 1 to 50 characters"))]
    #[schema(example = "Shipped")]
    pub status: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StatusBody {
    Bare(String),
    Wrapped { status: String },
}

impl From<StatusBody> for UpdateOrderStatusRequest {
    fn from(body: StatusBody) -> Self {
        let status = match body {
            StatusBody::Bare(status) => status,
            StatusBody::Wrapped { status } => status,
        };

        Self {
            status: status.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CheckoutRecord {
    pub customer_id: i32,
    pub quotation_id: i32,
    pub now: NaiveDateTime,
}
