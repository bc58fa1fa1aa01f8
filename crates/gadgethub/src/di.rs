use crate::{
    abstract_trait::{
        auth::DynAuthService,
        cart::{DynCartRepository, DynCartService},
        order::{
            DynOrderCommandRepository, DynOrderCommandService, DynOrderQueryRepository,
            DynOrderQueryService,
        },
        product::{
            DynProductCommandRepository, DynProductCommandService, DynProductQueryRepository,
            DynProductQueryService,
        },
        quotation::{
            DynQuotationCommandRepository, DynQuotationCommandService,
            DynQuotationQueryRepository, DynQuotationQueryService,
        },
        user::{
            DynUserCommandRepository, DynUserCommandService, DynUserQueryRepository,
            DynUserQueryService,
        },
    },
    repository::{
        CartRepository, OrderCommandRepository, OrderQueryRepository, ProductCommandRepository,
        ProductQueryRepository, QuotationCommandRepository, QuotationQueryRepository,
        UserCommandRepository, UserQueryRepository,
    },
    service::{
        AuthService, AuthServiceDeps, CartService, CartServiceDeps, OrderCommandService,
        OrderCommandServiceDeps, OrderQueryService, OrderQueryServiceDeps, ProductCommandService,
        ProductCommandServiceDeps, ProductQueryService, QuotationCommandService,
        QuotationCommandServiceDeps, QuotationQueryService, UserCommandService, UserQueryService,
    },
};
use prometheus_client::registry::Registry;
use shared::{
    abstract_trait::{DynHashing, DynJwtService},
    config::ConnectionPool,
};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Storage handles the services are built on.
#[derive(Clone)]
pub struct Repositories {
    pub user_query: DynUserQueryRepository,
    pub user_command: DynUserCommandRepository,
    pub product_query: DynProductQueryRepository,
    pub product_command: DynProductCommandRepository,
    pub cart: DynCartRepository,
    pub quotation_query: DynQuotationQueryRepository,
    pub quotation_command: DynQuotationCommandRepository,
    pub order_query: DynOrderQueryRepository,
    pub order_command: DynOrderCommandRepository,
}

impl Repositories {
    pub fn postgres(pool: ConnectionPool) -> Self {
        Self {
            user_query: Arc::new(UserQueryRepository::new(pool.clone())),
            user_command: Arc::new(UserCommandRepository::new(pool.clone())),
            product_query: Arc::new(ProductQueryRepository::new(pool.clone())),
            product_command: Arc::new(ProductCommandRepository::new(pool.clone())),
            cart: Arc::new(CartRepository::new(pool.clone())),
            quotation_query: Arc::new(QuotationQueryRepository::new(pool.clone())),
            quotation_command: Arc::new(QuotationCommandRepository::new(pool.clone())),
            order_query: Arc::new(OrderQueryRepository::new(pool.clone())),
            order_command: Arc::new(OrderCommandRepository::new(pool)),
        }
    }
}

#[derive(Clone)]
pub struct DependenciesInject {
    pub auth_service: DynAuthService,
    pub user_query: DynUserQueryService,
    pub user_command: DynUserCommandService,
    pub product_query: DynProductQueryService,
    pub product_command: DynProductCommandService,
    pub cart_service: DynCartService,
    pub quotation_query: DynQuotationQueryService,
    pub quotation_command: DynQuotationCommandService,
    pub order_query: DynOrderQueryService,
    pub order_command: DynOrderCommandService,
}

impl std::fmt::Debug for DependenciesInject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependenciesInject")
            .field("auth_service", &"DynAuthService")
            .field("user_service", &"DynUserService")
            .field("product_service", &"DynProductService")
            .field("cart_service", &"DynCartService")
            .field("quotation_service", &"DynQuotationService")
            .field("order_service", &"DynOrderService")
            .finish()
    }
}

impl DependenciesInject {
    pub async fn new(
        pool: ConnectionPool,
        hashing: DynHashing,
        jwt: DynJwtService,
        quotation_expiry_days: i64,
        registry: Arc<Mutex<Registry>>,
    ) -> Self {
        Self::from_repositories(
            Repositories::postgres(pool),
            hashing,
            jwt,
            quotation_expiry_days,
            registry,
        )
        .await
    }

    pub async fn from_repositories(
        repos: Repositories,
        hashing: DynHashing,
        jwt: DynJwtService,
        quotation_expiry_days: i64,
        registry: Arc<Mutex<Registry>>,
    ) -> Self {
        let auth_service: DynAuthService = Arc::new(
            AuthService::new(AuthServiceDeps {
                query: repos.user_query.clone(),
                command: repos.user_command.clone(),
                hashing,
                jwt,
                registry: registry.clone(),
            })
            .await,
        );

        let user_query: DynUserQueryService =
            Arc::new(UserQueryService::new(repos.user_query.clone(), registry.clone()).await);

        let user_command: DynUserCommandService = Arc::new(
            UserCommandService::new(
                repos.user_query.clone(),
                repos.user_command.clone(),
                registry.clone(),
            )
            .await,
        );

        let product_query: DynProductQueryService = Arc::new(
            ProductQueryService::new(repos.product_query.clone(), registry.clone()).await,
        );

        let product_command: DynProductCommandService = Arc::new(
            ProductCommandService::new(ProductCommandServiceDeps {
                query: repos.product_query.clone(),
                command: repos.product_command.clone(),
                users: repos.user_query.clone(),
                registry: registry.clone(),
            })
            .await,
        );

        let cart_service: DynCartService = Arc::new(
            CartService::new(CartServiceDeps {
                cart: repos.cart.clone(),
                products: repos.product_query.clone(),
                registry: registry.clone(),
            })
            .await,
        );

        let quotation_query: DynQuotationQueryService = Arc::new(
            QuotationQueryService::new(repos.quotation_query.clone(), registry.clone()).await,
        );

        let quotation_command: DynQuotationCommandService = Arc::new(
            QuotationCommandService::new(QuotationCommandServiceDeps {
                query: repos.quotation_query.clone(),
                command: repos.quotation_command.clone(),
                expiry_days: quotation_expiry_days,
                registry: registry.clone(),
            })
            .await,
        );

        let order_query: DynOrderQueryService = Arc::new(
            OrderQueryService::new(OrderQueryServiceDeps {
                query: repos.order_query.clone(),
                registry: registry.clone(),
            })
            .await,
        );

        let order_command: DynOrderCommandService = Arc::new(
            OrderCommandService::new(OrderCommandServiceDeps {
                orders: repos.order_query,
                quotations: repos.quotation_query,
                command: repos.order_command,
                registry,
            })
            .await,
        );

        Self {
            auth_service,
            user_query,
            user_command,
            product_query,
            product_command,
            cart_service,
            quotation_query,
            quotation_command,
            order_query,
            order_command,
        }
    }
}
