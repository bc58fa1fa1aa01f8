mod command;
mod query;

pub use self::command::{EMPTY_CART, MIXED_DISTRIBUTORS, QuotationCommandRepository};
pub use self::query::QuotationQueryRepository;
