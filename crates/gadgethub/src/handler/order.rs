use crate::{
    abstract_trait::order::{DynOrderCommandService, DynOrderQueryService},
    domain::{
        requests::{auth::AuthUser, order::UpdateOrderStatusRequest},
        response::order::{OrderCreatedResponse, OrderResponse},
    },
    middleware::{jwt::auth_middleware, role::require_role, validate::SimpleValidatedJson},
    state::AppState,
};
use axum::{
    Extension, Json,
    extract::Path,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use shared::{domain::responses::ApiResponse, errors::HttpError, model::UserRole};
use std::sync::Arc;
use utoipa_axum::router::OpenApiRouter;

#[utoipa::path(
    post,
    path = "/api/Order/checkout/{quotationId}",
    tag = "Order",
    security(("bearer_auth" = [])),
    params(("quotationId" = i32, Path, description = "Approved quotation to convert")),
    responses(
        (status = 201, description = "Order placed", body = ApiResponse<OrderCreatedResponse>),
        (status = 400, description = "Quotation not approved, expired, or stock exhausted"),
        (status = 404, description = "Quotation not found")
    )
)]
pub async fn checkout(
    Extension(service): Extension<DynOrderCommandService>,
    Extension(user): Extension<AuthUser>,
    Path(quotation_id): Path<i32>,
) -> Result<impl IntoResponse, HttpError> {
    let response = service.checkout(&user, quotation_id).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/api/Order/all",
    tag = "Order",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All orders, newest first", body = Vec<OrderResponse>),
        (status = 403, description = "Admins only")
    )
)]
pub async fn get_all_orders(
    Extension(service): Extension<DynOrderQueryService>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&user, &[UserRole::Admin])?;

    let response = service.find_all().await?;
    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    get,
    path = "/api/Order/my-orders",
    tag = "Order",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller's orders, newest first", body = Vec<OrderResponse>)
    )
)]
pub async fn my_orders(
    Extension(service): Extension<DynOrderQueryService>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, HttpError> {
    let response = service.my_orders(user.user_id).await?;
    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    get,
    path = "/api/Order/{id}",
    tag = "Order",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with items", body = OrderResponse),
        (status = 403, description = "Not the caller's order"),
        (status = 404, description = "Order not found")
    )
)]
pub async fn get_order(
    Extension(service): Extension<DynOrderQueryService>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, HttpError> {
    let response = service.find_by_id(&user, id).await?;
    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    put,
    path = "/api/Order/update-status/{id}",
    tag = "Order",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<OrderResponse>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Order not found")
    )
)]
pub async fn update_order_status(
    Extension(service): Extension<DynOrderCommandService>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i32>,
    SimpleValidatedJson(body): SimpleValidatedJson<UpdateOrderStatusRequest>,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&user, &[UserRole::Admin, UserRole::Distributor])?;

    let response = service.update_status(id, &body).await?;
    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    delete,
    path = "/api/Order/{id}",
    tag = "Order",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order deleted", body = serde_json::Value),
        (status = 404, description = "Order not found")
    )
)]
pub async fn delete_order(
    Extension(service): Extension<DynOrderCommandService>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&user, &[UserRole::Admin])?;

    let response = service.delete_order(id).await?;
    Ok((StatusCode::OK, Json(response)))
}

pub fn order_routes(app_state: Arc<AppState>) -> OpenApiRouter {
    OpenApiRouter::new()
        .route("/api/Order/checkout/{quotationId}", post(checkout))
        .route("/api/Order/all", get(get_all_orders))
        .route("/api/Order/my-orders", get(my_orders))
        .route("/api/Order/{id}", get(get_order).delete(delete_order))
        .route("/api/Order/update-status/{id}", put(update_order_status))
        .route_layer(middleware::from_fn(auth_middleware))
        .layer(Extension(app_state.di_container.order_query.clone()))
        .layer(Extension(app_state.di_container.order_command.clone()))
        .layer(Extension(app_state.jwt_config.clone()))
}
