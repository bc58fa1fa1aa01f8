mod auth;
mod cart;
mod order;
mod product;
mod quotation;
mod user;

pub use self::auth::{AuthService, AuthServiceDeps};
pub use self::cart::{CartService, CartServiceDeps};
pub use self::order::{
    OrderCommandService, OrderCommandServiceDeps, OrderQueryService, OrderQueryServiceDeps,
};
pub use self::product::{
    ProductCommandService, ProductCommandServiceDeps, ProductQueryService,
};
pub use self::quotation::{
    QuotationCommandService, QuotationCommandServiceDeps, QuotationQueryService,
};
pub use self::user::{UserCommandService, UserQueryService};

use shared::errors::{RepositoryError, ServiceError};

/// Guarded writes report rule violations as conflicts; callers see them as bad requests.
pub(crate) fn conflict_as_bad_request(err: RepositoryError) -> ServiceError {
    match err {
        RepositoryError::Conflict(msg) => ServiceError::BadRequest(msg),
        other => ServiceError::Repo(other),
    }
}
