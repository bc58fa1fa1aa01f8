mod repository;
mod service;

pub use self::repository::{
    DynQuotationCommandRepository, DynQuotationQueryRepository, QuotationCommandRepositoryTrait,
    QuotationQueryRepositoryTrait,
};
pub use self::service::{
    DynQuotationCommandService, DynQuotationQueryService, QuotationCommandServiceTrait,
    QuotationQueryServiceTrait,
};
