use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuotationItem {
    pub id: i32,
    pub quotation_id: i32,
    pub product_id: i32,
    pub product_name: String,
    pub quantity: i32,
    pub offered_unit_price: Decimal,
}
