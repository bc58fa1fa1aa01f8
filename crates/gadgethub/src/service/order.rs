use super::conflict_as_bad_request;
use crate::{
    abstract_trait::{
        order::{
            DynOrderCommandRepository, DynOrderQueryRepository, OrderCommandServiceTrait,
            OrderQueryServiceTrait,
        },
        quotation::DynQuotationQueryRepository,
    },
    domain::{
        requests::{
            auth::AuthUser,
            order::{CheckoutRecord, UpdateOrderStatusRequest},
        },
        response::order::{OrderCreatedResponse, OrderResponse},
    },
    model::{order::Order, order_item::OrderItem, quotation::QuotationStatus},
};
use async_trait::async_trait;
use chrono::Utc;
use opentelemetry::KeyValue;
use prometheus_client::registry::Registry;
use shared::{
    domain::responses::ApiResponse,
    errors::{RepositoryError, ServiceError},
    model::UserRole,
    utils::{Method, ServiceObserver},
};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;
use tracing::{error, info};

const ORDER_NOT_FOUND: &str = "Order not found.";

fn assemble(orders: Vec<Order>, items: Vec<OrderItem>) -> Vec<OrderResponse> {
    let mut by_order: HashMap<i32, Vec<OrderItem>> = HashMap::new();
    for item in items {
        by_order.entry(item.order_id).or_default().push(item);
    }

    orders
        .into_iter()
        .map(|o| {
            let items = by_order.remove(&o.id).unwrap_or_default();
            OrderResponse::from_parts(o, items)
        })
        .collect()
}

pub struct OrderQueryService {
    query: DynOrderQueryRepository,
    observer: ServiceObserver,
}

pub struct OrderQueryServiceDeps {
    pub query: DynOrderQueryRepository,
    pub registry: Arc<Mutex<Registry>>,
}

impl OrderQueryService {
    pub async fn new(deps: OrderQueryServiceDeps) -> Self {
        let OrderQueryServiceDeps { query, registry } = deps;

        Self {
            query,
            observer: ServiceObserver::new("order-query-service", registry).await,
        }
    }

    async fn with_items(&self, orders: Vec<Order>) -> Result<Vec<OrderResponse>, ServiceError> {
        let ids: Vec<i32> = orders.iter().map(|o| o.id).collect();
        let items = self.query.find_items(&ids).await?;
        Ok(assemble(orders, items))
    }
}

#[async_trait]
impl OrderQueryServiceTrait for OrderQueryService {
    async fn find_all(&self) -> Result<Vec<OrderResponse>, ServiceError> {
        let tracing_ctx = self.observer.start_tracing(
            "FindAllOrders",
            vec![KeyValue::new("component", "order")],
        );

        let orders = match self.query.find_all().await {
            Ok(orders) => orders,
            Err(e) => {
                error!("❌ Failed to fetch orders: {e:?}");
                self.observer
                    .complete_tracing_error(&tracing_ctx, Method::Get, "Failed to fetch orders")
                    .await;
                return Err(ServiceError::Repo(e));
            }
        };

        let response = self
            .observer
            .trace_err(&tracing_ctx, Method::Get, self.with_items(orders).await)
            .await?;

        self.observer
            .complete_tracing_success(&tracing_ctx, Method::Get, "Orders fetched")
            .await;

        Ok(response)
    }

    async fn my_orders(&self, customer_id: i32) -> Result<Vec<OrderResponse>, ServiceError> {
        let tracing_ctx = self.observer.start_tracing(
            "MyOrders",
            vec![
                KeyValue::new("component", "order"),
                KeyValue::new("customer.id", customer_id as i64),
            ],
        );

        let orders = self
            .observer
            .trace_err(
                &tracing_ctx,
                Method::Get,
                self.query.find_by_customer(customer_id).await,
            )
            .await?;
        let response = self
            .observer
            .trace_err(&tracing_ctx, Method::Get, self.with_items(orders).await)
            .await?;

        self.observer
            .complete_tracing_success(&tracing_ctx, Method::Get, "Customer orders fetched")
            .await;

        Ok(response)
    }

    async fn find_by_id(
        &self,
        caller: &AuthUser,
        id: i32,
    ) -> Result<OrderResponse, ServiceError> {
        let order = self
            .query
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(ORDER_NOT_FOUND.to_string()))?;

        if caller.role == UserRole::Customer && order.customer_id != caller.user_id {
            return Err(ServiceError::Forbidden(
                "You can only view your own orders".to_string(),
            ));
        }

        let items = self.query.find_items(&[order.id]).await?;
        Ok(OrderResponse::from_parts(order, items))
    }
}

pub struct OrderCommandService {
    orders: DynOrderQueryRepository,
    quotations: DynQuotationQueryRepository,
    command: DynOrderCommandRepository,
    observer: ServiceObserver,
}

pub struct OrderCommandServiceDeps {
    pub orders: DynOrderQueryRepository,
    pub quotations: DynQuotationQueryRepository,
    pub command: DynOrderCommandRepository,
    pub registry: Arc<Mutex<Registry>>,
}

impl OrderCommandService {
    pub async fn new(deps: OrderCommandServiceDeps) -> Self {
        let OrderCommandServiceDeps {
            orders,
            quotations,
            command,
            registry,
        } = deps;

        Self {
            orders,
            quotations,
            command,
            observer: ServiceObserver::new("order-command-service", registry).await,
        }
    }

    /// Pre-checks that give a precise message; the transactional update in
    /// the repository still decides the race.
    async fn ensure_checkout_allowed(
        &self,
        caller: &AuthUser,
        quotation_id: i32,
    ) -> Result<(), ServiceError> {
        let quotation = self
            .quotations
            .find_by_id(quotation_id)
            .await?
            .filter(|q| q.customer_id == caller.user_id)
            .ok_or_else(|| ServiceError::NotFound("Quotation not found.".to_string()))?;

        if quotation.status != QuotationStatus::Approved {
            return Err(ServiceError::BadRequest(
                "Quotation is not approved.".to_string(),
            ));
        }

        if quotation.is_expired(Utc::now().naive_utc()) {
            return Err(ServiceError::BadRequest(
                "Quotation has expired.".to_string(),
            ));
        }

        Ok(())
    }
}

#[async_trait]
impl OrderCommandServiceTrait for OrderCommandService {
    async fn checkout(
        &self,
        caller: &AuthUser,
        quotation_id: i32,
    ) -> Result<ApiResponse<OrderCreatedResponse>, ServiceError> {
        info!(
            "💳 Customer {} checking out quotation {quotation_id}",
            caller.user_id
        );

        let tracing_ctx = self.observer.start_tracing(
            "Checkout",
            vec![
                KeyValue::new("component", "order"),
                KeyValue::new("customer.id", caller.user_id as i64),
                KeyValue::new("quotation.id", quotation_id as i64),
            ],
        );

        if let Err(e) = self.ensure_checkout_allowed(caller, quotation_id).await {
            self.observer
                .complete_tracing_error(&tracing_ctx, Method::Post, &e.to_string())
                .await;
            return Err(e);
        }

        let record = CheckoutRecord {
            customer_id: caller.user_id,
            quotation_id,
            now: Utc::now().naive_utc(),
        };

        let order = match self.command.checkout(&record).await {
            Ok(order) => order,
            Err(e) => {
                error!("❌ Checkout of quotation {quotation_id} failed: {e:?}");
                let err = conflict_as_bad_request(e);
                self.observer
                    .complete_tracing_error(&tracing_ctx, Method::Post, &err.to_string())
                    .await;
                return Err(err);
            }
        };

        info!("✅ Order {} placed from quotation {quotation_id}", order.id);

        self.observer
            .complete_tracing_success(&tracing_ctx, Method::Post, "Order placed")
            .await;

        Ok(ApiResponse::success(
            "Order placed successfully!",
            OrderCreatedResponse { order_id: order.id },
        ))
    }

    async fn update_status(
        &self,
        id: i32,
        req: &UpdateOrderStatusRequest,
    ) -> Result<ApiResponse<OrderResponse>, ServiceError> {
        let tracing_ctx = self.observer.start_tracing(
            "UpdateOrderStatus",
            vec![
                KeyValue::new("component", "order"),
                KeyValue::new("order.id", id as i64),
            ],
        );

        let status = req.status.trim();
        if status.is_empty() {
            self.observer
                .complete_tracing_error(&tracing_ctx, Method::Put, "Empty status")
                .await;
            return Err(ServiceError::BadRequest("Status is required".to_string()));
        }

        let order = match self.command.update_status(id, status).await {
            Ok(order) => order,
            Err(RepositoryError::NotFound) => {
                self.observer
                    .complete_tracing_error(&tracing_ctx, Method::Put, "Order not found")
                    .await;
                return Err(ServiceError::NotFound(ORDER_NOT_FOUND.to_string()));
            }
            Err(e) => {
                self.observer
                    .complete_tracing_error(&tracing_ctx, Method::Put, "Failed to update order")
                    .await;
                return Err(ServiceError::Repo(e));
            }
        };

        let items = self
            .observer
            .trace_err(&tracing_ctx, Method::Put, self.orders.find_items(&[order.id]).await)
            .await?;

        self.observer
            .complete_tracing_success(&tracing_ctx, Method::Put, "Order status updated")
            .await;

        Ok(ApiResponse::success(
            "Order status updated.",
            OrderResponse::from_parts(order, items),
        ))
    }

    async fn delete_order(&self, id: i32) -> Result<ApiResponse<()>, ServiceError> {
        let tracing_ctx = self.observer.start_tracing(
            "DeleteOrder",
            vec![
                KeyValue::new("component", "order"),
                KeyValue::new("order.id", id as i64),
            ],
        );

        match self.command.delete_order(id).await {
            Ok(()) => {}
            Err(RepositoryError::NotFound) => {
                self.observer
                    .complete_tracing_error(&tracing_ctx, Method::Delete, "Order not found")
                    .await;
                return Err(ServiceError::NotFound(ORDER_NOT_FOUND.to_string()));
            }
            Err(e) => {
                self.observer
                    .complete_tracing_error(&tracing_ctx, Method::Delete, "Failed to delete order")
                    .await;
                return Err(ServiceError::Repo(e));
            }
        }

        self.observer
            .complete_tracing_success(&tracing_ctx, Method::Delete, "Order deleted")
            .await;

        Ok(ApiResponse::success("Order deleted successfully.", ()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestContext;
    use rust_decimal_macros::dec;

    async fn approved_quotation(ctx: &TestContext, price: &str, qty: i32) -> (AuthUser, i32) {
        let (customer, distributor, quotation_id) = ctx.pending_quotation(price, qty).await;
        ctx.quotation_command
            .approve(&distributor, quotation_id, &[])
            .await
            .unwrap();
        (customer, quotation_id)
    }

    #[tokio::test]
    async fn checkout_snapshots_prices_and_decrements_stock() {
        let ctx = TestContext::new().await;
        let (customer, distributor, quotation_id) = ctx.pending_quotation("100.00", 3).await;
        let product_id = ctx.quotation_product(quotation_id);

        ctx.quotation_command
            .approve(
                &distributor,
                quotation_id,
                &[crate::domain::requests::quotation::QuotationItemUpdateRequest {
                    product_id,
                    negotiated_price: dec!(90.00),
                }],
            )
            .await
            .unwrap();

        let stock_before = ctx.store.stock_of(product_id);
        let created = ctx.order_command.checkout(&customer, quotation_id).await.unwrap();

        let order = ctx
            .order_query
            .find_by_id(&customer, created.data.order_id)
            .await
            .unwrap();

        assert_eq!(order.status, "Processing");
        assert_eq!(order.from_quotation_id, Some(quotation_id));
        assert_eq!(order.total_amount, dec!(270.00));
        assert_eq!(order.items[0].unit_price, dec!(90.00));
        assert_eq!(ctx.store.stock_of(product_id), stock_before - 3);

        ctx.store.set_price(product_id, "500.00");
        let again = ctx
            .order_query
            .find_by_id(&customer, created.data.order_id)
            .await
            .unwrap();
        assert_eq!(again.items[0].unit_price, dec!(90.00));
    }

    #[tokio::test]
    async fn stock_change_carries_the_order_timestamp() {
        let ctx = TestContext::new().await;
        let (customer, quotation_id) = approved_quotation(&ctx, "20.00", 2).await;
        let product_id = ctx.quotation_product(quotation_id);

        let created = ctx.order_command.checkout(&customer, quotation_id).await.unwrap();
        let order = ctx
            .order_query
            .find_by_id(&customer, created.data.order_id)
            .await
            .unwrap();

        assert_eq!(ctx.store.product_updated_at(product_id), order.order_date);
    }

    #[tokio::test]
    async fn second_checkout_of_same_quotation_fails() {
        let ctx = TestContext::new().await;
        let (customer, quotation_id) = approved_quotation(&ctx, "10.00", 1).await;

        ctx.order_command.checkout(&customer, quotation_id).await.unwrap();
        let err = ctx
            .order_command
            .checkout(&customer, quotation_id)
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::BadRequest(_)));
        assert_eq!(ctx.order_query.my_orders(customer.user_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn pending_quotation_cannot_be_checked_out() {
        let ctx = TestContext::new().await;
        let (customer, _, quotation_id) = ctx.pending_quotation("10.00", 1).await;

        let err = ctx
            .order_command
            .checkout(&customer, quotation_id)
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::BadRequest(ref m) if m == "Quotation is not approved."));
    }

    #[tokio::test]
    async fn foreign_quotation_is_not_found() {
        let ctx = TestContext::new().await;
        let (_, quotation_id) = approved_quotation(&ctx, "10.00", 1).await;
        let other = ctx.auth_user("other@example.com", UserRole::Customer);

        let err = ctx
            .order_command
            .checkout(&other, quotation_id)
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn expired_approved_quotation_cannot_be_checked_out() {
        let ctx = TestContext::new().await;
        let (customer, quotation_id) = approved_quotation(&ctx, "10.00", 1).await;
        ctx.store.expire_quotation(quotation_id);

        let err = ctx
            .order_command
            .checkout(&customer, quotation_id)
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::BadRequest(ref m) if m == "Quotation has expired."));
    }

    #[tokio::test]
    async fn insufficient_stock_leaves_everything_untouched() {
        let ctx = TestContext::new().await;
        let (customer, quotation_id) = approved_quotation(&ctx, "10.00", 4).await;
        let product_id = ctx.quotation_product(quotation_id);
        ctx.store.set_stock(product_id, 2);

        let err = ctx
            .order_command
            .checkout(&customer, quotation_id)
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::BadRequest(ref m) if m.starts_with("Insufficient stock")));
        assert_eq!(ctx.store.stock_of(product_id), 2);
        assert!(ctx.order_query.my_orders(customer.user_id).await.unwrap().is_empty());

        let quotation = ctx
            .quotation_query
            .find_by_id(&customer, quotation_id)
            .await
            .unwrap();
        assert_eq!(quotation.status, QuotationStatus::Approved);
    }

    #[tokio::test]
    async fn customers_only_see_their_own_orders() {
        let ctx = TestContext::new().await;
        let (customer, quotation_id) = approved_quotation(&ctx, "10.00", 1).await;
        let created = ctx.order_command.checkout(&customer, quotation_id).await.unwrap();
        let stranger = ctx.auth_user("stranger@example.com", UserRole::Customer);
        let admin = ctx.auth_user("admin@example.com", UserRole::Admin);

        let err = ctx
            .order_query
            .find_by_id(&stranger, created.data.order_id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        assert!(
            ctx.order_query
                .find_by_id(&admin, created.data.order_id)
                .await
                .is_ok()
        );
        assert_eq!(ctx.order_query.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn status_update_is_free_text_and_trimmed() {
        let ctx = TestContext::new().await;
        let (customer, quotation_id) = approved_quotation(&ctx, "10.00", 1).await;
        let created = ctx.order_command.checkout(&customer, quotation_id).await.unwrap();

        let updated = ctx
            .order_command
            .update_status(
                created.data.order_id,
                &UpdateOrderStatusRequest {
                    status: "  Shipped ".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.data.status, "Shipped");

        let missing = ctx
            .order_command
            .update_status(
                9999,
                &UpdateOrderStatusRequest {
                    status: "Shipped".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(missing, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_removes_order_and_keeps_quotation_converted() {
        let ctx = TestContext::new().await;
        let (customer, quotation_id) = approved_quotation(&ctx, "10.00", 1).await;
        let created = ctx.order_command.checkout(&customer, quotation_id).await.unwrap();

        ctx.order_command
            .delete_order(created.data.order_id)
            .await
            .unwrap();

        let err = ctx
            .order_query
            .find_by_id(&customer, created.data.order_id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let quotation = ctx
            .quotation_query
            .find_by_id(&customer, quotation_id)
            .await
            .unwrap();
        assert_eq!(quotation.status, QuotationStatus::ConvertedToOrder);
    }
}
