use super::conflict_as_bad_request;
use crate::{
    abstract_trait::quotation::{
        DynQuotationCommandRepository, DynQuotationQueryRepository, QuotationCommandServiceTrait,
        QuotationQueryServiceTrait,
    },
    domain::{
        requests::{
            auth::AuthUser,
            quotation::{ApproveQuotationRecord, CreateQuotationRecord, QuotationItemUpdateRequest},
        },
        response::quotation::{QuotationCreatedResponse, QuotationResponse},
    },
    model::{
        quotation::{Quotation, QuotationStatus},
        quotation_item::QuotationItem,
    },
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use opentelemetry::KeyValue;
use prometheus_client::registry::Registry;
use rust_decimal::Decimal;
use shared::{
    domain::responses::ApiResponse,
    errors::ServiceError,
    model::UserRole,
    utils::{Method, ServiceObserver, TracingContext},
};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;
use tracing::{info, warn};

const QUOTATION_NOT_FOUND: &str = "Quotation not found.";

/// Joins quotations with their items, keeping the quotation order.
fn assemble(
    quotations: Vec<Quotation>,
    items: Vec<QuotationItem>,
) -> Vec<QuotationResponse> {
    let mut by_quotation: HashMap<i32, Vec<QuotationItem>> = HashMap::new();
    for item in items {
        by_quotation.entry(item.quotation_id).or_default().push(item);
    }

    quotations
        .into_iter()
        .map(|q| {
            let items = by_quotation.remove(&q.id).unwrap_or_default();
            QuotationResponse::from_parts(q, items)
        })
        .collect()
}

fn can_view(caller: &AuthUser, quotation: &Quotation) -> bool {
    caller.is_admin()
        || quotation.customer_id == caller.user_id
        || quotation.distributor_id == caller.user_id
}

fn can_decide(caller: &AuthUser, quotation: &Quotation) -> bool {
    match caller.role {
        UserRole::Admin => true,
        UserRole::Distributor => quotation.distributor_id == caller.user_id,
        UserRole::Customer => false,
    }
}

pub struct QuotationQueryService {
    query: DynQuotationQueryRepository,
    observer: ServiceObserver,
}

impl QuotationQueryService {
    pub async fn new(query: DynQuotationQueryRepository, registry: Arc<Mutex<Registry>>) -> Self {
        Self {
            query,
            observer: ServiceObserver::new("quotation-query-service", registry).await,
        }
    }

    async fn with_items(
        &self,
        quotations: Vec<Quotation>,
    ) -> Result<Vec<QuotationResponse>, ServiceError> {
        let ids: Vec<i32> = quotations.iter().map(|q| q.id).collect();
        let items = self.query.find_items(&ids).await?;
        Ok(assemble(quotations, items))
    }
}

#[async_trait]
impl QuotationQueryServiceTrait for QuotationQueryService {
    async fn my_quotations(
        &self,
        customer_id: i32,
    ) -> Result<Vec<QuotationResponse>, ServiceError> {
        let tracing_ctx = self.observer.start_tracing(
            "MyQuotations",
            vec![
                KeyValue::new("component", "quotation"),
                KeyValue::new("customer.id", customer_id as i64),
            ],
        );

        let quotations = self
            .observer
            .trace_err(
                &tracing_ctx,
                Method::Get,
                self.query.find_by_customer(customer_id).await,
            )
            .await?;
        let response = self
            .observer
            .trace_err(&tracing_ctx, Method::Get, self.with_items(quotations).await)
            .await?;

        self.observer
            .complete_tracing_success(&tracing_ctx, Method::Get, "Quotations fetched")
            .await;

        Ok(response)
    }

    async fn pending_requests(
        &self,
        caller: &AuthUser,
    ) -> Result<Vec<QuotationResponse>, ServiceError> {
        let distributor_filter = match caller.role {
            UserRole::Admin => None,
            UserRole::Distributor => Some(caller.user_id),
            UserRole::Customer => {
                return Err(ServiceError::Forbidden(
                    "Only distributors and admins can view pending requests".to_string(),
                ));
            }
        };

        let tracing_ctx = self.observer.start_tracing(
            "PendingRequests",
            vec![
                KeyValue::new("component", "quotation"),
                KeyValue::new("caller.id", caller.user_id as i64),
                KeyValue::new("caller.role", caller.role.to_string()),
            ],
        );

        let quotations = self
            .observer
            .trace_err(
                &tracing_ctx,
                Method::Get,
                self.query.find_pending(distributor_filter).await,
            )
            .await?;
        let response = self
            .observer
            .trace_err(&tracing_ctx, Method::Get, self.with_items(quotations).await)
            .await?;

        self.observer
            .complete_tracing_success(&tracing_ctx, Method::Get, "Pending quotations fetched")
            .await;

        Ok(response)
    }

    async fn find_by_id(
        &self,
        caller: &AuthUser,
        id: i32,
    ) -> Result<QuotationResponse, ServiceError> {
        let quotation = self
            .query
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(QUOTATION_NOT_FOUND.to_string()))?;

        if !can_view(caller, &quotation) {
            return Err(ServiceError::Forbidden(
                "You are not a party to this quotation".to_string(),
            ));
        }

        let items = self.query.find_items(&[quotation.id]).await?;
        Ok(QuotationResponse::from_parts(quotation, items))
    }
}

pub struct QuotationCommandService {
    query: DynQuotationQueryRepository,
    command: DynQuotationCommandRepository,
    expiry_days: i64,
    observer: ServiceObserver,
}

pub struct QuotationCommandServiceDeps {
    pub query: DynQuotationQueryRepository,
    pub command: DynQuotationCommandRepository,
    pub expiry_days: i64,
    pub registry: Arc<Mutex<Registry>>,
}

impl QuotationCommandService {
    pub async fn new(deps: QuotationCommandServiceDeps) -> Self {
        let QuotationCommandServiceDeps {
            query,
            command,
            expiry_days,
            registry,
        } = deps;

        Self {
            query,
            command,
            expiry_days,
            observer: ServiceObserver::new("quotation-command-service", registry).await,
        }
    }

    async fn fail<T>(
        &self,
        tracing_ctx: &TracingContext,
        method: Method,
        err: ServiceError,
    ) -> Result<T, ServiceError> {
        warn!("⚠️ {err}");
        self.observer
            .complete_tracing_error(tracing_ctx, method, &err.to_string())
            .await;
        Err(err)
    }

    /// Loads the quotation and checks the caller may approve or reject it.
    async fn load_for_decision(
        &self,
        caller: &AuthUser,
        id: i32,
    ) -> Result<Quotation, ServiceError> {
        let quotation = self
            .query
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(QUOTATION_NOT_FOUND.to_string()))?;

        if !can_decide(caller, &quotation) {
            return Err(ServiceError::Forbidden(
                "This quotation is addressed to another distributor".to_string(),
            ));
        }

        Ok(quotation)
    }
}

#[async_trait]
impl QuotationCommandServiceTrait for QuotationCommandService {
    async fn request_from_cart(
        &self,
        caller: &AuthUser,
    ) -> Result<ApiResponse<QuotationCreatedResponse>, ServiceError> {
        info!("📝 Customer {} requesting a quotation", caller.user_id);

        let tracing_ctx = self.observer.start_tracing(
            "RequestQuotation",
            vec![
                KeyValue::new("component", "quotation"),
                KeyValue::new("customer.id", caller.user_id as i64),
            ],
        );

        if caller.role != UserRole::Customer {
            return self
                .fail(
                    &tracing_ctx,
                    Method::Post,
                    ServiceError::Forbidden("Only customers can request quotations".to_string()),
                )
                .await;
        }

        let now = Utc::now().naive_utc();
        let record = CreateQuotationRecord {
            customer_id: caller.user_id,
            expiry_date: now + Duration::days(self.expiry_days),
            now,
        };

        let quotation = match self.command.create_from_cart(&record).await {
            Ok(q) => q,
            Err(e) => {
                return self
                    .fail(&tracing_ctx, Method::Post, conflict_as_bad_request(e))
                    .await;
            }
        };

        self.observer
            .complete_tracing_success(&tracing_ctx, Method::Post, "Quotation requested")
            .await;

        Ok(ApiResponse::success(
            "Quotation requested successfully",
            QuotationCreatedResponse {
                quotation_id: quotation.id,
            },
        ))
    }

    async fn approve(
        &self,
        caller: &AuthUser,
        id: i32,
        updates: &[QuotationItemUpdateRequest],
    ) -> Result<ApiResponse<QuotationResponse>, ServiceError> {
        info!("✅ User {} approving quotation {id}", caller.user_id);

        let tracing_ctx = self.observer.start_tracing(
            "ApproveQuotation",
            vec![
                KeyValue::new("component", "quotation"),
                KeyValue::new("quotation.id", id as i64),
                KeyValue::new("caller.id", caller.user_id as i64),
            ],
        );

        let quotation = match self.load_for_decision(caller, id).await {
            Ok(q) => q,
            Err(e) => return self.fail(&tracing_ctx, Method::Put, e).await,
        };

        if quotation.status != QuotationStatus::Pending {
            return self
                .fail(
                    &tracing_ctx,
                    Method::Put,
                    ServiceError::BadRequest(format!(
                        "Only pending quotations can be approved; this one is {}.",
                        quotation.status
                    )),
                )
                .await;
        }

        let now = Utc::now().naive_utc();
        if quotation.is_expired(now) {
            return self
                .fail(
                    &tracing_ctx,
                    Method::Put,
                    ServiceError::BadRequest("Quotation has expired.".to_string()),
                )
                .await;
        }

        let items = self
            .observer
            .trace_err(&tracing_ctx, Method::Put, self.query.find_items(&[quotation.id]).await)
            .await?;
        for update in updates {
            if update.negotiated_price < Decimal::ZERO {
                return self
                    .fail(
                        &tracing_ctx,
                        Method::Put,
                        ServiceError::BadRequest(format!(
                            "Negotiated price for product {} cannot be negative.",
                            update.product_id
                        )),
                    )
                    .await;
            }

            if !items.iter().any(|i| i.product_id == update.product_id) {
                return self
                    .fail(
                        &tracing_ctx,
                        Method::Put,
                        ServiceError::BadRequest(format!(
                            "Product {} is not part of this quotation.",
                            update.product_id
                        )),
                    )
                    .await;
            }
        }

        let record = ApproveQuotationRecord {
            quotation_id: quotation.id,
            prices: updates.to_vec(),
            now,
        };

        let approved = match self.command.approve(&record).await {
            Ok(q) => q,
            Err(e) => {
                return self
                    .fail(&tracing_ctx, Method::Put, conflict_as_bad_request(e))
                    .await;
            }
        };

        let items = self
            .observer
            .trace_err(&tracing_ctx, Method::Put, self.query.find_items(&[approved.id]).await)
            .await?;

        self.observer
            .complete_tracing_success(&tracing_ctx, Method::Put, "Quotation approved")
            .await;

        Ok(ApiResponse::success(
            "Quotation approved and sent to customer.",
            QuotationResponse::from_parts(approved, items),
        ))
    }

    async fn reject(
        &self,
        caller: &AuthUser,
        id: i32,
    ) -> Result<ApiResponse<QuotationResponse>, ServiceError> {
        info!("🚫 User {} rejecting quotation {id}", caller.user_id);

        let tracing_ctx = self.observer.start_tracing(
            "RejectQuotation",
            vec![
                KeyValue::new("component", "quotation"),
                KeyValue::new("quotation.id", id as i64),
                KeyValue::new("caller.id", caller.user_id as i64),
            ],
        );

        let quotation = match self.load_for_decision(caller, id).await {
            Ok(q) => q,
            Err(e) => return self.fail(&tracing_ctx, Method::Put, e).await,
        };

        if quotation.status != QuotationStatus::Pending {
            return self
                .fail(
                    &tracing_ctx,
                    Method::Put,
                    ServiceError::BadRequest(format!(
                        "Only pending quotations can be rejected; this one is {}.",
                        quotation.status
                    )),
                )
                .await;
        }

        let rejected = match self.command.reject(quotation.id).await {
            Ok(q) => q,
            Err(e) => {
                return self
                    .fail(&tracing_ctx, Method::Put, conflict_as_bad_request(e))
                    .await;
            }
        };

        let items = self
            .observer
            .trace_err(&tracing_ctx, Method::Put, self.query.find_items(&[rejected.id]).await)
            .await?;

        self.observer
            .complete_tracing_success(&tracing_ctx, Method::Put, "Quotation rejected")
            .await;

        Ok(ApiResponse::success(
            "Quotation rejected.",
            QuotationResponse::from_parts(rejected, items),
        ))
    }
}
