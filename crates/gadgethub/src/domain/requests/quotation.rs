use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuotationItemUpdateRequest {
    pub product_id: i32,

    #[schema(value_type = f64, example = 120.00)]
    pub negotiated_price: Decimal,
}

#[derive(Debug, Clone)]
pub struct CreateQuotationRecord {
    pub customer_id: i32,
    pub expiry_date: NaiveDateTime,
    pub now: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct ApproveQuotationRecord {
    pub quotation_id: i32,
    pub prices: Vec<QuotationItemUpdateRequest>,
    pub now: NaiveDateTime,
}
