use crate::{
    abstract_trait::{
        cart::{CartServiceTrait, DynCartRepository},
        product::DynProductQueryRepository,
    },
    domain::{requests::cart::AddToCartRequest, response::cart::CartResponse},
};
use async_trait::async_trait;
use opentelemetry::KeyValue;
use prometheus_client::registry::Registry;
use shared::{
    domain::responses::ApiResponse,
    errors::ServiceError,
    utils::{Method, ServiceObserver},
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

pub struct CartService {
    cart: DynCartRepository,
    products: DynProductQueryRepository,
    observer: ServiceObserver,
}

pub struct CartServiceDeps {
    pub cart: DynCartRepository,
    pub products: DynProductQueryRepository,
    pub registry: Arc<Mutex<Registry>>,
}

impl CartService {
    pub async fn new(deps: CartServiceDeps) -> Self {
        let CartServiceDeps {
            cart,
            products,
            registry,
        } = deps;

        Self {
            cart,
            products,
            observer: ServiceObserver::new("cart-service", registry).await,
        }
    }
}

#[async_trait]
impl CartServiceTrait for CartService {
    async fn get_cart(&self, user_id: i32) -> Result<CartResponse, ServiceError> {
        let lines = self.cart.find_by_user(user_id).await?;
        Ok(CartResponse::from(lines))
    }

    async fn add_to_cart(
        &self,
        user_id: i32,
        req: &AddToCartRequest,
    ) -> Result<ApiResponse<CartResponse>, ServiceError> {
        info!(
            "🛒 User {user_id} adding {} x product {}",
            req.quantity, req.product_id
        );

        let tracing_ctx = self.observer.start_tracing(
            "AddToCart",
            vec![
                KeyValue::new("component", "cart"),
                KeyValue::new("user.id", user_id as i64),
                KeyValue::new("product.id", req.product_id as i64),
            ],
        );

        if req.quantity < 1 {
            self.observer
                .complete_tracing_error(&tracing_ctx, Method::Post, "Invalid quantity")
                .await;
            return Err(ServiceError::BadRequest(
                "Quantity must be at least 1".to_string(),
            ));
        }

        let product = self
            .observer
            .trace_err(
                &tracing_ctx,
                Method::Post,
                self.products.find_by_id(req.product_id).await,
            )
            .await?;

        let Some(product) = product else {
            self.observer
                .complete_tracing_error(&tracing_ctx, Method::Post, "Product not found")
                .await;
            return Err(ServiceError::NotFound("Product not found.".to_string()));
        };

        let in_cart = self
            .observer
            .trace_err(
                &tracing_ctx,
                Method::Post,
                self.cart.find_item(user_id, req.product_id).await,
            )
            .await?
            .map(|item| item.quantity)
            .unwrap_or(0);

        let wanted = in_cart.checked_add(req.quantity);
        if wanted.is_none_or(|total| total > product.stock_quantity) {
            warn!(
                "⚠️ Stock exceeded for product {}: requested={} in_cart={} available={}",
                product.id, req.quantity, in_cart, product.stock_quantity
            );
            self.observer
                .complete_tracing_error(&tracing_ctx, Method::Post, "Insufficient stock")
                .await;
            return Err(ServiceError::BadRequest(format!(
                "Only {} units of '{}' are in stock.",
                product.stock_quantity, product.name
            )));
        }

        self.observer
            .trace_err(
                &tracing_ctx,
                Method::Post,
                self.cart
                    .add_quantity(user_id, req.product_id, req.quantity)
                    .await,
            )
            .await?;

        let lines = self
            .observer
            .trace_err(&tracing_ctx, Method::Post, self.cart.find_by_user(user_id).await)
            .await?;
        let cart = CartResponse::from(lines);

        self.observer
            .complete_tracing_success(&tracing_ctx, Method::Post, "Cart updated")
            .await;

        Ok(ApiResponse::success("Cart updated successfully!", cart))
    }

    async fn remove_item(
        &self,
        user_id: i32,
        item_id: i32,
    ) -> Result<ApiResponse<()>, ServiceError> {
        let tracing_ctx = self.observer.start_tracing(
            "RemoveCartItem",
            vec![
                KeyValue::new("component", "cart"),
                KeyValue::new("user.id", user_id as i64),
                KeyValue::new("cart_item.id", item_id as i64),
            ],
        );

        let removed = self
            .observer
            .trace_err(
                &tracing_ctx,
                Method::Delete,
                self.cart.remove_item(user_id, item_id).await,
            )
            .await?;

        if !removed {
            self.observer
                .complete_tracing_error(&tracing_ctx, Method::Delete, "Cart item not found")
                .await;
            return Err(ServiceError::NotFound("Item not found in cart.".to_string()));
        }

        self.observer
            .complete_tracing_success(&tracing_ctx, Method::Delete, "Cart item removed")
            .await;

        Ok(ApiResponse::success("Item removed from cart.", ()))
    }

    async fn clear_cart(&self, user_id: i32) -> Result<ApiResponse<()>, ServiceError> {
        let tracing_ctx = self.observer.start_tracing(
            "ClearCart",
            vec![
                KeyValue::new("component", "cart"),
                KeyValue::new("user.id", user_id as i64),
            ],
        );

        self.observer
            .trace_err(&tracing_ctx, Method::Delete, self.cart.clear(user_id).await)
            .await?;

        self.observer
            .complete_tracing_success(&tracing_ctx, Method::Delete, "Cart cleared")
            .await;

        Ok(ApiResponse::success("Cart cleared successfully.", ()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestContext;
    use rust_decimal_macros::dec;
    use shared::model::UserRole;

    #[tokio::test]
    async fn adding_same_product_twice_increments_one_row() {
        let ctx = TestContext::new().await;
        let customer = ctx.store.seed_user("C", "c@example.com", UserRole::Customer);
        let distributor = ctx
            .store
            .seed_user("D", "d@example.com", UserRole::Distributor);
        let product = ctx.store.seed_product("Tablet", "250.00", 10, distributor.id);

        let req = AddToCartRequest {
            product_id: product.id,
            quantity: 2,
        };
        ctx.cart.add_to_cart(customer.id, &req).await.unwrap();
        let response = ctx.cart.add_to_cart(customer.id, &req).await.unwrap();

        assert_eq!(response.data.items.len(), 1);
        assert_eq!(response.data.items[0].quantity, 4);
        assert_eq!(response.data.items[0].line_total, dec!(1000.00));
        assert_eq!(response.data.grand_total, dec!(1000.00));
    }

    #[tokio::test]
    async fn quantity_beyond_stock_is_rejected() {
        let ctx = TestContext::new().await;
        let customer = ctx.store.seed_user("C", "c@example.com", UserRole::Customer);
        let distributor = ctx
            .store
            .seed_user("D", "d@example.com", UserRole::Distributor);
        let product = ctx.store.seed_product("Camera", "500.00", 3, distributor.id);

        ctx.cart
            .add_to_cart(
                customer.id,
                &AddToCartRequest {
                    product_id: product.id,
                    quantity: 2,
                },
            )
            .await
            .unwrap();

        let err = ctx
            .cart
            .add_to_cart(
                customer.id,
                &AddToCartRequest {
                    product_id: product.id,
                    quantity: 2,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::BadRequest(_)));
        assert_eq!(ctx.cart.get_cart(customer.id).await.unwrap().items[0].quantity, 2);
    }

    #[tokio::test]
    async fn huge_quantity_on_top_of_existing_row_is_bad_request() {
        let ctx = TestContext::new().await;
        let customer = ctx.store.seed_user("C", "c@example.com", UserRole::Customer);
        let distributor = ctx
            .store
            .seed_user("D", "d@example.com", UserRole::Distributor);
        let product = ctx.store.seed_product("Drone", "900.00", 10, distributor.id);

        ctx.cart
            .add_to_cart(
                customer.id,
                &AddToCartRequest {
                    product_id: product.id,
                    quantity: 1,
                },
            )
            .await
            .unwrap();

        let err = ctx
            .cart
            .add_to_cart(
                customer.id,
                &AddToCartRequest {
                    product_id: product.id,
                    quantity: i32::MAX,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::BadRequest(ref m) if m.contains("in stock")));
        assert_eq!(ctx.cart.get_cart(customer.id).await.unwrap().items[0].quantity, 1);
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let ctx = TestContext::new().await;
        let customer = ctx.store.seed_user("C", "c@example.com", UserRole::Customer);

        let err = ctx
            .cart
            .add_to_cart(
                customer.id,
                &AddToCartRequest {
                    product_id: 999,
                    quantity: 1,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn only_the_owner_can_remove_a_row() {
        let ctx = TestContext::new().await;
        let owner = ctx.store.seed_user("O", "o@example.com", UserRole::Customer);
        let other = ctx.store.seed_user("X", "x@example.com", UserRole::Customer);
        let distributor = ctx
            .store
            .seed_user("D", "d@example.com", UserRole::Distributor);
        let product = ctx.store.seed_product("Mouse", "20.00", 10, distributor.id);

        let cart = ctx
            .cart
            .add_to_cart(
                owner.id,
                &AddToCartRequest {
                    product_id: product.id,
                    quantity: 1,
                },
            )
            .await
            .unwrap();
        let item_id = cart.data.items[0].id;

        let err = ctx.cart.remove_item(other.id, item_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        ctx.cart.remove_item(owner.id, item_id).await.unwrap();
        assert!(ctx.cart.get_cart(owner.id).await.unwrap().items.is_empty());
    }

    #[tokio::test]
    async fn clear_empties_only_the_callers_cart() {
        let ctx = TestContext::new().await;
        let first = ctx.store.seed_user("A", "a@example.com", UserRole::Customer);
        let second = ctx.store.seed_user("B", "b@example.com", UserRole::Customer);
        let distributor = ctx
            .store
            .seed_user("D", "d@example.com", UserRole::Distributor);
        let product = ctx.store.seed_product("Cable", "5.00", 50, distributor.id);

        for user in [first.id, second.id] {
            ctx.cart
                .add_to_cart(
                    user,
                    &AddToCartRequest {
                        product_id: product.id,
                        quantity: 1,
                    },
                )
                .await
                .unwrap();
        }

        ctx.cart.clear_cart(first.id).await.unwrap();

        assert!(ctx.cart.get_cart(first.id).await.unwrap().items.is_empty());
        assert_eq!(ctx.cart.get_cart(second.id).await.unwrap().items.len(), 1);
    }
}
