mod cart;
mod order;
mod product;
mod quotation;
mod user;

pub use self::cart::CartRepository;
pub use self::order::{OrderCommandRepository, OrderQueryRepository};
pub use self::product::{ProductCommandRepository, ProductQueryRepository};
pub use self::quotation::{
    EMPTY_CART, MIXED_DISTRIBUTORS, QuotationCommandRepository, QuotationQueryRepository,
};
pub use self::user::{UserCommandRepository, UserQueryRepository};
