use crate::model::{
    quotation::{Quotation, QuotationStatus},
    quotation_item::QuotationItem,
};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuotationItemResponse {
    pub product_id: i32,
    pub product_name: String,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub price_at_quote: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub line_total: Decimal,
}

impl From<QuotationItem> for QuotationItemResponse {
    fn from(value: QuotationItem) -> Self {
        QuotationItemResponse {
            product_id: value.product_id,
            product_name: value.product_name,
            quantity: value.quantity,
            price_at_quote: value.offered_unit_price,
            line_total: value.offered_unit_price * Decimal::from(value.quantity),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuotationResponse {
    pub id: i32,
    pub customer_id: i32,
    pub distributor_id: i32,
    pub status: QuotationStatus,
    #[schema(value_type = String, format = DateTime)]
    pub expiry_date: NaiveDateTime,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub grand_total: Decimal,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: NaiveDateTime,
    pub items: Vec<QuotationItemResponse>,
}

impl QuotationResponse {
    pub fn from_parts(quotation: Quotation, items: Vec<QuotationItem>) -> Self {
        QuotationResponse {
            id: quotation.id,
            customer_id: quotation.customer_id,
            distributor_id: quotation.distributor_id,
            status: quotation.status,
            expiry_date: quotation.expiry_date,
            grand_total: quotation.grand_total,
            created_at: quotation.created_at,
            items: items.into_iter().map(QuotationItemResponse::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuotationCreatedResponse {
    pub quotation_id: i32,
}
