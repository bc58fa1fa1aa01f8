mod auth;
mod cart;
mod order;
mod product;
mod quotation;
mod user;

use crate::{
    domain::{
        requests::{
            auth::{
                LoginRequest, RegisterAdminRequest, RegisterCustomerRequest,
                RegisterDistributorRequest,
            },
            cart::AddToCartRequest,
            order::UpdateOrderStatusRequest,
            product::CreateProductRequest,
            quotation::QuotationItemUpdateRequest,
            user::UpdateUserRequest,
        },
        response::{
            auth::LoginResponse,
            cart::{CartItemResponse, CartResponse},
            order::{OrderCreatedResponse, OrderItemResponse, OrderResponse},
            product::ProductResponse,
            quotation::{QuotationCreatedResponse, QuotationItemResponse, QuotationResponse},
            user::UserResponse,
        },
    },
    model::quotation::QuotationStatus,
    state::AppState,
};
use anyhow::Result;
use axum::{
    Json, Router,
    body::Body,
    extract::{DefaultBodyLimit, State},
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::get,
};
use prometheus_client::encoding::text::encode;
use shared::{errors::ErrorResponse, model::UserRole, utils::shutdown_signal};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::info;
use utoipa::{
    Modify, OpenApi,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

pub use self::auth::auth_routes;
pub use self::cart::cart_routes;
pub use self::order::order_routes;
pub use self::product::{TOTAL_COUNT_HEADER, product_routes};
pub use self::quotation::quotation_routes;
pub use self::user::user_routes;

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register_customer_handler,
        auth::register_distributor_handler,
        auth::register_admin_handler,
        auth::login_handler,
        auth::get_me_handler,

        user::get_users,
        user::get_user,
        user::update_user,
        user::delete_user,

        product::get_products,
        product::get_product,
        product::create_product,
        product::update_product,
        product::delete_product,

        cart::get_cart,
        cart::add_to_cart,
        cart::remove_from_cart,
        cart::clear_cart,

        quotation::request_from_cart,
        quotation::my_quotations,
        quotation::pending_requests,
        quotation::get_quotation,
        quotation::approve_quotation,
        quotation::reject_quotation,

        order::checkout,
        order::get_all_orders,
        order::my_orders,
        order::get_order,
        order::update_order_status,
        order::delete_order,
    ),
    components(schemas(
        ErrorResponse,
        UserRole,
        QuotationStatus,
        RegisterCustomerRequest,
        RegisterDistributorRequest,
        RegisterAdminRequest,
        LoginRequest,
        LoginResponse,
        UpdateUserRequest,
        UserResponse,
        CreateProductRequest,
        ProductResponse,
        AddToCartRequest,
        CartItemResponse,
        CartResponse,
        QuotationItemUpdateRequest,
        QuotationItemResponse,
        QuotationResponse,
        QuotationCreatedResponse,
        UpdateOrderStatusRequest,
        OrderItemResponse,
        OrderResponse,
        OrderCreatedResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration and login"),
        (name = "User", description = "Staff user management"),
        (name = "Product", description = "Product catalog"),
        (name = "Cart", description = "Customer shopping cart"),
        (name = "Quotation", description = "Request-for-quotation workflow"),
        (name = "Order", description = "Orders placed from approved quotations"),
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);

        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

pub async fn health_checker_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "success",
            "message": "GadgetHub API is running"
        })),
    )
}

pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    let mut buffer = String::new();

    let registry = state.registry.lock().await;

    if let Err(e) = encode(&mut buffer, &registry) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to encode metrics: {e}"),
        )
            .into_response();
    }

    (
        StatusCode::OK,
        [(
            CONTENT_TYPE,
            "application/openmetrics-text; version=1.0.0; charset=utf-8",
        )],
        Body::from(buffer),
    )
        .into_response()
}

pub struct AppRouter;

impl AppRouter {
    /// Builds the complete application, Swagger UI included.
    pub fn router(app_state: AppState) -> Router {
        let shared_state = Arc::new(app_state);

        let api_router = OpenApiRouter::with_openapi(ApiDoc::openapi())
            .route("/metrics", get(metrics_handler))
            .route("/api/healthchecker", get(health_checker_handler))
            .with_state(shared_state.clone())
            .merge(auth_routes(shared_state.clone()))
            .merge(user_routes(shared_state.clone()))
            .merge(product_routes(shared_state.clone()))
            .merge(cart_routes(shared_state.clone()))
            .merge(quotation_routes(shared_state.clone()))
            .merge(order_routes(shared_state));

        let router_with_layers = api_router
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(10 * 1024 * 1024))
            .layer(TraceLayer::new_for_http());

        let (app_router, api) = router_with_layers.split_for_parts();

        app_router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api))
    }

    pub async fn serve(port: u16, app_state: AppState) -> Result<()> {
        let app = Self::router(app_state);

        let addr = format!("0.0.0.0:{port}");
        let listener = TcpListener::bind(&addr).await?;

        info!("🚀 Server running on http://{}", listener.local_addr()?);
        info!("📖 Swagger UI: http://localhost:{port}/swagger-ui");
        info!("📊 Metrics: http://localhost:{port}/metrics");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}
