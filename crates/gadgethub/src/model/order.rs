use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const DEFAULT_ORDER_STATUS: &str = "Processing";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: i32,
    pub customer_id: i32,
    pub order_date: NaiveDateTime,
    pub total_amount: Decimal,
    pub status: String,
    pub from_quotation_id: Option<i32>,
}
