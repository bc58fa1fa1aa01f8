use crate::{
    abstract_trait::{
        auth::AuthServiceTrait,
        user::{DynUserCommandRepository, DynUserQueryRepository},
    },
    domain::{
        requests::{
            auth::{
                LoginRequest, RegisterAdminRequest, RegisterCustomerRequest,
                RegisterDistributorRequest,
            },
            user::CreateUserRecord,
        },
        response::{auth::LoginResponse, user::UserResponse},
    },
};
use async_trait::async_trait;
use opentelemetry::KeyValue;
use prometheus_client::registry::Registry;
use shared::{
    abstract_trait::{DynHashing, DynJwtService},
    config::ACCESS_TOKEN,
    domain::responses::ApiResponse,
    errors::{RepositoryError, ServiceError},
    model::UserRole,
    utils::{Method, ServiceObserver},
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

pub struct AuthService {
    query: DynUserQueryRepository,
    command: DynUserCommandRepository,
    hashing: DynHashing,
    jwt: DynJwtService,
    observer: ServiceObserver,
}

pub struct AuthServiceDeps {
    pub query: DynUserQueryRepository,
    pub command: DynUserCommandRepository,
    pub hashing: DynHashing,
    pub jwt: DynJwtService,
    pub registry: Arc<Mutex<Registry>>,
}

impl AuthService {
    pub async fn new(deps: AuthServiceDeps) -> Self {
        let AuthServiceDeps {
            query,
            command,
            hashing,
            jwt,
            registry,
        } = deps;

        Self {
            query,
            command,
            hashing,
            jwt,
            observer: ServiceObserver::new("auth-service", registry).await,
        }
    }

    async fn register(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
        role: UserRole,
        company_name: Option<String>,
    ) -> Result<ApiResponse<UserResponse>, ServiceError> {
        let email = email.trim();
        info!("📝 Registering {role} account for {email}");

        let tracing_ctx = self.observer.start_tracing(
            "Register",
            vec![
                KeyValue::new("component", "auth"),
                KeyValue::new("user.email", email.to_string()),
                KeyValue::new("user.role", role.to_string()),
            ],
        );

        let existing = self
            .observer
            .trace_err(&tracing_ctx, Method::Post, self.query.find_by_email(email).await)
            .await?;

        if existing.is_some() {
            warn!("⚠️ Email already registered: {email}");
            self.observer
                .complete_tracing_error(&tracing_ctx, Method::Post, "Email already registered")
                .await;
            return Err(ServiceError::Conflict("Email already registered.".to_string()));
        }

        let hashed = self
            .observer
            .trace_err(&tracing_ctx, Method::Post, self.hashing.hash_password(password).await)
            .await?;

        let record = CreateUserRecord {
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            email: email.to_string(),
            password: hashed,
            role,
            company_name,
        };

        let user = match self.command.create_user(&record).await {
            Ok(user) => user,
            Err(RepositoryError::AlreadyExists(_)) => {
                self.observer
                    .complete_tracing_error(&tracing_ctx, Method::Post, "Email already registered")
                    .await;
                return Err(ServiceError::Conflict("Email already registered.".to_string()));
            }
            Err(e) => {
                self.observer
                    .complete_tracing_error(&tracing_ctx, Method::Post, &e.to_string())
                    .await;
                return Err(ServiceError::Repo(e));
            }
        };

        self.observer
            .complete_tracing_success(&tracing_ctx, Method::Post, "User registered")
            .await;

        Ok(ApiResponse::success(
            format!("{role} registered successfully!"),
            UserResponse::from(user),
        ))
    }
}

#[async_trait]
impl AuthServiceTrait for AuthService {
    async fn register_customer(
        &self,
        req: &RegisterCustomerRequest,
    ) -> Result<ApiResponse<UserResponse>, ServiceError> {
        self.register(
            &req.first_name,
            &req.last_name,
            &req.email,
            &req.password,
            UserRole::Customer,
            None,
        )
        .await
    }

    async fn register_distributor(
        &self,
        req: &RegisterDistributorRequest,
    ) -> Result<ApiResponse<UserResponse>, ServiceError> {
        self.register(
            &req.full_name,
            &req.full_name,
            &req.email,
            &req.password,
            UserRole::Distributor,
            Some(req.company_name.trim().to_string()),
        )
        .await
    }

    async fn register_admin(
        &self,
        req: &RegisterAdminRequest,
    ) -> Result<ApiResponse<UserResponse>, ServiceError> {
        self.register(
            &req.user_name,
            "Admin",
            &req.email,
            &req.password,
            UserRole::Admin,
            None,
        )
        .await
    }

    async fn login(&self, req: &LoginRequest) -> Result<LoginResponse, ServiceError> {
        let email = req.email.trim();
        info!("🔐 Attempting login for email: {email}");

        let tracing_ctx = self.observer.start_tracing(
            "Login",
            vec![
                KeyValue::new("component", "auth"),
                KeyValue::new("user.email", email.to_string()),
            ],
        );

        let found = self
            .observer
            .trace_err(&tracing_ctx, Method::Post, self.query.find_by_email(email).await)
            .await?;

        let Some(user) = found else {
            warn!("❌ Login failed, unknown email: {email}");
            self.observer
                .complete_tracing_error(&tracing_ctx, Method::Post, "Unknown email")
                .await;
            return Err(ServiceError::InvalidCredentials);
        };

        if let Err(e) = self
            .hashing
            .compare_password(&user.password, &req.password)
            .await
        {
            warn!("❌ Login failed for {email}: {e}");
            self.observer
                .complete_tracing_error(&tracing_ctx, Method::Post, "Password mismatch")
                .await;
            return Err(ServiceError::InvalidCredentials);
        }

        let token = self
            .observer
            .trace_err(
                &tracing_ctx,
                Method::Post,
                self.jwt
                    .generate_token(user.id as i64, &user.email, user.role, ACCESS_TOKEN),
            )
            .await?;

        self.observer
            .complete_tracing_success(&tracing_ctx, Method::Post, "Login successful")
            .await;

        Ok(LoginResponse {
            message: "Login successful".to_string(),
            token,
            email: user.email,
            role: user.role,
            first_name: user.first_name,
        })
    }

    async fn get_me(&self, user_id: i32) -> Result<UserResponse, ServiceError> {
        let tracing_ctx = self.observer.start_tracing(
            "GetMe",
            vec![
                KeyValue::new("component", "auth"),
                KeyValue::new("user.id", user_id as i64),
            ],
        );

        let found = self
            .observer
            .trace_err(&tracing_ctx, Method::Get, self.query.find_by_id(user_id).await)
            .await?;

        match found {
            Some(user) => {
                self.observer
                    .complete_tracing_success(&tracing_ctx, Method::Get, "Profile fetched")
                    .await;
                Ok(UserResponse::from(user))
            }
            None => {
                self.observer
                    .complete_tracing_error(&tracing_ctx, Method::Get, "User not found")
                    .await;
                Err(ServiceError::NotFound("User not found.".to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestContext;

    fn customer(email: &str) -> RegisterCustomerRequest {
        RegisterCustomerRequest {
            first_name: "Nimal".into(),
            last_name: "Perera".into(),
            email: email.into(),
            password: "secret123".into(),
        }
    }

    #[tokio::test]
    async fn register_stores_bcrypt_hash_and_customer_role() {
        let ctx = TestContext::new().await;

        let response = ctx
            .auth
            .register_customer(&customer("nimal@example.com"))
            .await
            .unwrap();

        assert_eq!(response.data.role, UserRole::Customer);

        let stored = ctx.store.user_by_email("nimal@example.com").unwrap();
        assert_ne!(stored.password, "secret123");
        assert!(stored.password.starts_with("$2"));
    }

    #[tokio::test]
    async fn duplicate_email_is_conflict() {
        let ctx = TestContext::new().await;
        ctx.auth
            .register_customer(&customer("dup@example.com"))
            .await
            .unwrap();

        let err = ctx
            .auth
            .register_customer(&customer("dup@example.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn distributor_full_name_fills_both_names() {
        let ctx = TestContext::new().await;
        let response = ctx
            .auth
            .register_distributor(&RegisterDistributorRequest {
                full_name: "Kamal Silva".into(),
                email: "kamal@techlanka.lk".into(),
                password: "secret123".into(),
                company_name: "TechLanka".into(),
            })
            .await
            .unwrap();

        assert_eq!(response.data.first_name, "Kamal Silva");
        assert_eq!(response.data.last_name, "Kamal Silva");
        assert_eq!(response.data.role, UserRole::Distributor);
        assert_eq!(response.data.company_name.as_deref(), Some("TechLanka"));
    }

    #[tokio::test]
    async fn login_returns_token_for_valid_credentials() {
        let ctx = TestContext::new().await;
        ctx.auth
            .register_customer(&customer("login@example.com"))
            .await
            .unwrap();

        let response = ctx
            .auth
            .login(&LoginRequest {
                email: "login@example.com".into(),
                password: "secret123".into(),
            })
            .await
            .unwrap();

        assert_eq!(response.first_name, "Nimal");
        assert_eq!(response.role, UserRole::Customer);

        let claims = ctx.jwt.verify_token(&response.token, ACCESS_TOKEN).unwrap();
        assert_eq!(claims.email, "login@example.com");
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let ctx = TestContext::new().await;
        ctx.auth
            .register_customer(&customer("who@example.com"))
            .await
            .unwrap();

        let wrong_password = ctx
            .auth
            .login(&LoginRequest {
                email: "who@example.com".into(),
                password: "bad-password".into(),
            })
            .await
            .unwrap_err();
        let unknown = ctx
            .auth
            .login(&LoginRequest {
                email: "nobody@example.com".into(),
                password: "secret123".into(),
            })
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, ServiceError::InvalidCredentials));
        assert!(matches!(unknown, ServiceError::InvalidCredentials));
    }

    #[tokio::test]
    async fn get_me_for_missing_user_is_not_found() {
        let ctx = TestContext::new().await;

        let err = ctx.auth.get_me(999).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
