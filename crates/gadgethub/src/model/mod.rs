pub mod cart_item;
pub mod order;
pub mod order_item;
pub mod product;
pub mod quotation;
pub mod quotation_item;
pub mod user;
