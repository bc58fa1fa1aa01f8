use crate::model::product::Product;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: i32,
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 149.99)]
    pub price: Decimal,
    pub stock_quantity: i32,
    pub category: String,
    pub image_url: String,
    pub distributor_id: i32,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: NaiveDateTime,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: NaiveDateTime,
}

impl From<Product> for ProductResponse {
    fn from(value: Product) -> Self {
        ProductResponse {
            id: value.id,
            name: value.name,
            description: value.description,
            price: value.price,
            stock_quantity: value.stock_quantity,
            category: value.category,
            image_url: value.image_url,
            distributor_id: value.distributor_id,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}
