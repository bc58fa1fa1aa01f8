use crate::model::cart_item::CartLine;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartItemResponse {
    pub id: i32,
    pub product_id: i32,
    pub product_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub unit_price: Decimal,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub line_total: Decimal,
}

impl From<CartLine> for CartItemResponse {
    fn from(value: CartLine) -> Self {
        let line_total = value.line_total();
        CartItemResponse {
            id: value.id,
            product_id: value.product_id,
            product_name: value.product_name,
            unit_price: value.unit_price,
            quantity: value.quantity,
            line_total,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub items: Vec<CartItemResponse>,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub grand_total: Decimal,
}

impl From<Vec<CartLine>> for CartResponse {
    fn from(lines: Vec<CartLine>) -> Self {
        let items: Vec<CartItemResponse> = lines.into_iter().map(CartItemResponse::from).collect();
        let grand_total = items.iter().map(|i| i.line_total).sum();

        CartResponse { items, grand_total }
    }
}
