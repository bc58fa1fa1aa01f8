use crate::{
    abstract_trait::product::{DynProductCommandService, DynProductQueryService},
    domain::{
        requests::{
            auth::AuthUser,
            product::{CreateProductRequest, FindAllProducts, UpdateProductRequest},
        },
        response::product::ProductResponse,
    },
    middleware::{jwt::auth_middleware, role::require_role, validate::SimpleValidatedJson},
    state::AppState,
};
use axum::{
    Extension, Json,
    extract::{Path, Query},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use shared::{domain::responses::ApiResponse, errors::HttpError, model::UserRole};
use std::sync::Arc;
use utoipa_axum::router::OpenApiRouter;
use validator::Validate;

pub const TOTAL_COUNT_HEADER: &str = "X-Total-Count";

#[utoipa::path(
    get,
    path = "/api/Product",
    tag = "Product",
    params(FindAllProducts),
    responses(
        (status = 200, description = "Catalog page; total in the X-Total-Count header", body = Vec<ProductResponse>),
        (status = 400, description = "Invalid paging parameters")
    )
)]
pub async fn get_products(
    Extension(service): Extension<DynProductQueryService>,
    Query(params): Query<FindAllProducts>,
) -> Result<impl IntoResponse, HttpError> {
    params
        .validate()
        .map_err(|e| HttpError::BadRequest(e.to_string()))?;

    let (products, pagination) = service.find_all(&params).await?;
    Ok((
        StatusCode::OK,
        [(TOTAL_COUNT_HEADER, pagination.total_items.to_string())],
        Json(products),
    ))
}

#[utoipa::path(
    get,
    path = "/api/Product/{id}",
    tag = "Product",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product details", body = ProductResponse),
        (status = 404, description = "Product not found")
    )
)]
pub async fn get_product(
    Extension(service): Extension<DynProductQueryService>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, HttpError> {
    let response = service.find_by_id(id).await?;
    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    post,
    path = "/api/Product",
    tag = "Product",
    security(("bearer_auth" = [])),
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ApiResponse<ProductResponse>),
        (status = 400, description = "Validation error or unknown distributor"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admins only")
    )
)]
pub async fn create_product(
    Extension(service): Extension<DynProductCommandService>,
    Extension(user): Extension<AuthUser>,
    SimpleValidatedJson(body): SimpleValidatedJson<CreateProductRequest>,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&user, &[UserRole::Admin])?;

    let response = service.create_product(&body).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    put,
    path = "/api/Product/{id}",
    tag = "Product",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ApiResponse<ProductResponse>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Product not found")
    )
)]
pub async fn update_product(
    Extension(service): Extension<DynProductCommandService>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i32>,
    SimpleValidatedJson(body): SimpleValidatedJson<UpdateProductRequest>,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&user, &[UserRole::Admin])?;

    let response = service.update_product(id, &body).await?;
    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    delete,
    path = "/api/Product/{id}",
    tag = "Product",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product deleted", body = serde_json::Value),
        (status = 400, description = "Product is referenced by order history"),
        (status = 404, description = "Product not found")
    )
)]
pub async fn delete_product(
    Extension(service): Extension<DynProductCommandService>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&user, &[UserRole::Admin])?;

    let response = service.delete_product(id).await?;
    Ok((StatusCode::OK, Json(response)))
}

pub fn product_routes(app_state: Arc<AppState>) -> OpenApiRouter {
    let public = OpenApiRouter::new()
        .route("/api/Product", get(get_products))
        .route("/api/Product/{id}", get(get_product));

    let admin = OpenApiRouter::new()
        .route("/api/Product", post(create_product))
        .route("/api/Product/{id}", put(update_product).delete(delete_product))
        .route_layer(middleware::from_fn(auth_middleware));

    public
        .merge(admin)
        .layer(Extension(app_state.di_container.product_query.clone()))
        .layer(Extension(app_state.di_container.product_command.clone()))
        .layer(Extension(app_state.jwt_config.clone()))
}
