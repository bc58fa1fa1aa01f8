use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

pub const DEFAULT_CATEGORY: &str = "General";
pub const DEFAULT_IMAGE_URL: &str = "default-gadget.png";

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema, IntoParams)]
pub struct FindAllProducts {
    #[serde(default = "default_page")]
    #[validate(range(min = 1))]
    pub page: i32,

    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 100))]
    pub page_size: i32,

    #[serde(default)]
    pub search: String,

    #[serde(default)]
    pub category: Option<String>,
}

impl Default for FindAllProducts {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
            search: String::new(),
            category: None,
        }
    }
}

fn default_page() -> i32 {
    1
}

fn default_page_size() -> i32 {
    100
}

fn validate_non_negative_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() && !price.is_zero() {
        let mut err = ValidationError::new("range");
        err.message = Some("Price cannot be negative".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    #[schema(example = "Galaxy Buds Pro")]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[validate(custom(function = "validate_non_negative_price"))]
    #[schema(value_type = f64, example = 149.99)]
    pub price: Decimal,

    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    #[schema(example = 25)]
    pub stock_quantity: i32,

    #[validate(length(max = 100))]
    pub category: Option<String>,

    #[validate(range(min = 1, message = "Distributor is required"))]
    pub distributor_id: i32,

    #[validate(length(max = 500))]
    pub image_url: Option<String>,
}

pub type UpdateProductRequest = CreateProductRequest;

/// Product values with defaults already applied.
#[derive(Debug, Clone)]
pub struct ProductRecord {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub category: String,
    pub image_url: String,
    pub distributor_id: i32,
}

impl From<CreateProductRequest> for ProductRecord {
    fn from(req: CreateProductRequest) -> Self {
        let category = req
            .category
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
        let image_url = req
            .image_url
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_IMAGE_URL.to_string());

        Self {
            name: req.name,
            description: req.description,
            price: req.price,
            stock_quantity: req.stock_quantity,
            category,
            image_url,
            distributor_id: req.distributor_id,
        }
    }
}
