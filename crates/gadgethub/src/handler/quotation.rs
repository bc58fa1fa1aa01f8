use crate::{
    abstract_trait::quotation::{DynQuotationCommandService, DynQuotationQueryService},
    domain::{
        requests::{auth::AuthUser, quotation::QuotationItemUpdateRequest},
        response::quotation::{QuotationCreatedResponse, QuotationResponse},
    },
    middleware::{jwt::auth_middleware, role::require_role},
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

const DECIDERS: &[UserRole] = &[UserRole::Distributor, UserRole::Admin];

#[utoipa::path(
    post,
    path = "/api/Quotation/request-from-cart",
    tag = "Quotation",
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Quotation requested", body = ApiResponse<QuotationCreatedResponse>),
        (status = 400, description = "Cart is empty or mixes distributors"),
        (status = 403, description = "Customers only")
    )
)]
pub async fn request_from_cart(
    Extension(service): Extension<DynQuotationCommandService>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&user, &[UserRole::Customer])?;

    let response = service.request_from_cart(&user).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/api/Quotation/my-quotations",
    tag = "Quotation",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller's quotations, newest first", body = Vec<QuotationResponse>)
    )
)]
pub async fn my_quotations(
    Extension(service): Extension<DynQuotationQueryService>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, HttpError> {
    let response = service.my_quotations(user.user_id).await?;
    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    get,
    path = "/api/Quotation/pending-requests",
    tag = "Quotation",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Pending quotations visible to the caller", body = Vec<QuotationResponse>),
        (status = 403, description = "Distributors and admins only")
    )
)]
pub async fn pending_requests(
    Extension(service): Extension<DynQuotationQueryService>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&user, DECIDERS)?;

    let response = service.pending_requests(&user).await?;
    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    get,
    path = "/api/Quotation/{id}",
    tag = "Quotation",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Quotation ID")),
    responses(
        (status = 200, description = "Quotation with items", body = QuotationResponse),
        (status = 403, description = "Not a party to this quotation"),
        (status = 404, description = "Quotation not found")
    )
)]
pub async fn get_quotation(
    Extension(service): Extension<DynQuotationQueryService>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, HttpError> {
    let response = service.find_by_id(&user, id).await?;
    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    put,
    path = "/api/Quotation/approve/{id}",
    tag = "Quotation",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Quotation ID")),
    request_body = Vec<QuotationItemUpdateRequest>,
    responses(
        (status = 200, description = "Quotation approved", body = ApiResponse<QuotationResponse>),
        (status = 400, description = "Not pending, expired, or invalid prices"),
        (status = 403, description = "Addressed to another distributor"),
        (status = 404, description = "Quotation not found")
    )
)]
pub async fn approve_quotation(
    Extension(service): Extension<DynQuotationCommandService>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(body): Json<Vec<QuotationItemUpdateRequest>>,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&user, DECIDERS)?;

    let response = service.approve(&user, id, &body).await?;
    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    put,
    path = "/api/Quotation/reject/{id}",
    tag = "Quotation",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Quotation ID")),
    responses(
        (status = 200, description = "Quotation rejected", body = ApiResponse<QuotationResponse>),
        (status = 400, description = "Not pending"),
        (status = 403, description = "Addressed to another distributor"),
        (status = 404, description = "Quotation not found")
    )
)]
pub async fn reject_quotation(
    Extension(service): Extension<DynQuotationCommandService>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&user, DECIDERS)?;

    let response = service.reject(&user, id).await?;
    Ok((StatusCode::OK, Json(response)))
}

pub fn quotation_routes(app_state: Arc<AppState>) -> OpenApiRouter {
    OpenApiRouter::new()
        .route(
            "/api/Quotation/request-from-cart",
            post(request_from_cart),
        )
        .route("/api/Quotation/my-quotations", get(my_quotations))
        .route("/api/Quotation/pending-requests", get(pending_requests))
        .route("/api/Quotation/{id}", get(get_quotation))
        .route("/api/Quotation/approve/{id}", put(approve_quotation))
        .route("/api/Quotation/reject/{id}", put(reject_quotation))
        .route_layer(middleware::from_fn(auth_middleware))
        .layer(Extension(app_state.di_container.quotation_query.clone()))
        .layer(Extension(app_state.di_container.quotation_command.clone()))
        .layer(Extension(app_state.jwt_config.clone()))
}
