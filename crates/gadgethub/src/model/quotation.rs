use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "quotation_status")]
pub enum QuotationStatus {
    Pending,
    Approved,
    Rejected,
    ConvertedToOrder,
}

impl fmt::Display for QuotationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QuotationStatus::Pending => "Pending",
            QuotationStatus::Approved => "Approved",
            QuotationStatus::Rejected => "Rejected",
            QuotationStatus::ConvertedToOrder => "ConvertedToOrder",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Quotation {
    pub id: i32,
    pub customer_id: i32,
    pub distributor_id: i32,
    pub expiry_date: NaiveDateTime,
    pub status: QuotationStatus,
    pub grand_total: Decimal,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Quotation {
    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        self.expiry_date <= now
    }
}
