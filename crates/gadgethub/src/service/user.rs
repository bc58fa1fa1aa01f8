use crate::{
    abstract_trait::user::{
        DynUserCommandRepository, DynUserQueryRepository, UserCommandServiceTrait,
        UserQueryServiceTrait,
    },
    domain::{
        requests::user::{FindAllUsers, UpdateUserRecord, UpdateUserRequest},
        response::user::UserResponse,
    },
};
use async_trait::async_trait;
use opentelemetry::KeyValue;
use prometheus_client::registry::Registry;
use shared::{
    domain::responses::{ApiResponse, ApiResponsePagination, Pagination},
    errors::{RepositoryError, ServiceError},
    model::UserRole,
    utils::{Method, ServiceObserver},
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

pub struct UserQueryService {
    query: DynUserQueryRepository,
    observer: ServiceObserver,
}

impl UserQueryService {
    pub async fn new(query: DynUserQueryRepository, registry: Arc<Mutex<Registry>>) -> Self {
        Self {
            query,
            observer: ServiceObserver::new("user-query-service", registry).await,
        }
    }
}

#[async_trait]
impl UserQueryServiceTrait for UserQueryService {
    async fn find_all(
        &self,
        req: &FindAllUsers,
    ) -> Result<ApiResponsePagination<Vec<UserResponse>>, ServiceError> {
        let tracing_ctx = self.observer.start_tracing(
            "FindAllUsers",
            vec![
                KeyValue::new("component", "user"),
                KeyValue::new("page", req.page as i64),
                KeyValue::new("search", req.search.clone()),
            ],
        );

        let (users, total) = match self.query.find_all(req).await {
            Ok(found) => found,
            Err(e) => {
                self.observer
                    .complete_tracing_error(&tracing_ctx, Method::Get, &e.to_string())
                    .await;
                return Err(ServiceError::Repo(e));
            }
        };

        self.observer
            .complete_tracing_success(&tracing_ctx, Method::Get, "Users fetched")
            .await;

        Ok(ApiResponsePagination {
            status: "success".to_string(),
            message: "Users retrieved successfully".to_string(),
            data: users.into_iter().map(UserResponse::from).collect(),
            pagination: Pagination::new(req.page, req.page_size, total),
        })
    }

    async fn find_by_id(&self, id: i32) -> Result<UserResponse, ServiceError> {
        self.query
            .find_by_id(id)
            .await?
            .map(UserResponse::from)
            .ok_or_else(|| ServiceError::NotFound("User not found.".to_string()))
    }
}

pub struct UserCommandService {
    query: DynUserQueryRepository,
    command: DynUserCommandRepository,
    observer: ServiceObserver,
}

impl UserCommandService {
    pub async fn new(
        query: DynUserQueryRepository,
        command: DynUserCommandRepository,
        registry: Arc<Mutex<Registry>>,
    ) -> Self {
        Self {
            query,
            command,
            observer: ServiceObserver::new("user-command-service", registry).await,
        }
    }
}

#[async_trait]
impl UserCommandServiceTrait for UserCommandService {
    async fn update_user(
        &self,
        id: i32,
        req: &UpdateUserRequest,
    ) -> Result<ApiResponse<UserResponse>, ServiceError> {
        info!("🔄 Updating user {id}");

        let tracing_ctx = self.observer.start_tracing(
            "UpdateUser",
            vec![
                KeyValue::new("component", "user"),
                KeyValue::new("user.id", id as i64),
            ],
        );

        let existing = self
            .observer
            .trace_err(&tracing_ctx, Method::Put, self.query.find_by_id(id).await)
            .await?;

        if existing.is_none() {
            self.observer
                .complete_tracing_error(&tracing_ctx, Method::Put, "User not found")
                .await;
            return Err(ServiceError::NotFound("User not found.".to_string()));
        }

        let company_name = match req.role {
            UserRole::Distributor => req
                .company_name
                .as_ref()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            _ => None,
        };

        let record = UpdateUserRecord {
            id,
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
            role: req.role,
            company_name,
        };

        let user = self
            .observer
            .trace_err(&tracing_ctx, Method::Put, self.command.update_user(&record).await)
            .await?;

        self.observer
            .complete_tracing_success(&tracing_ctx, Method::Put, "User updated")
            .await;

        Ok(ApiResponse::success(
            "User updated successfully",
            UserResponse::from(user),
        ))
    }

    async fn delete_user(&self, id: i32) -> Result<ApiResponse<()>, ServiceError> {
        let tracing_ctx = self.observer.start_tracing(
            "DeleteUser",
            vec![
                KeyValue::new("component", "user"),
                KeyValue::new("user.id", id as i64),
            ],
        );

        let result = self.command.delete_user(id).await.map_err(|e| match e {
            RepositoryError::NotFound => ServiceError::NotFound("User not found.".to_string()),
            RepositoryError::ForeignKey(_) => ServiceError::BadRequest(
                "User still owns products, quotations or orders.".to_string(),
            ),
            other => ServiceError::Repo(other),
        });

        match result {
            Ok(()) => {
                self.observer
                    .complete_tracing_success(&tracing_ctx, Method::Delete, "User deleted")
                    .await;
                Ok(ApiResponse::success("User deleted successfully", ()))
            }
            Err(e) => {
                self.observer
                    .complete_tracing_error(&tracing_ctx, Method::Delete, &e.to_string())
                    .await;
                Err(e)
            }
        }
    }
}
