use crate::{
    abstract_trait::{
        product::{
            DynProductCommandRepository, DynProductQueryRepository, ProductCommandServiceTrait,
            ProductQueryServiceTrait,
        },
        user::DynUserQueryRepository,
    },
    domain::{
        requests::product::{
            CreateProductRequest, FindAllProducts, ProductRecord, UpdateProductRequest,
        },
        response::product::ProductResponse,
    },
};
use async_trait::async_trait;
use opentelemetry::KeyValue;
use prometheus_client::registry::Registry;
use shared::{
    domain::responses::{ApiResponse, Pagination},
    errors::{RepositoryError, ServiceError},
    model::UserRole,
    utils::{Method, ServiceObserver},
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

const PRODUCT_NOT_FOUND: &str = "Product not found.";

pub struct ProductQueryService {
    query: DynProductQueryRepository,
    observer: ServiceObserver,
}

impl ProductQueryService {
    pub async fn new(query: DynProductQueryRepository, registry: Arc<Mutex<Registry>>) -> Self {
        Self {
            query,
            observer: ServiceObserver::new("product-query-service", registry).await,
        }
    }
}

#[async_trait]
impl ProductQueryServiceTrait for ProductQueryService {
    async fn find_all(
        &self,
        req: &FindAllProducts,
    ) -> Result<(Vec<ProductResponse>, Pagination), ServiceError> {
        let tracing_ctx = self.observer.start_tracing(
            "FindAllProducts",
            vec![
                KeyValue::new("component", "product"),
                KeyValue::new("page", req.page as i64),
                KeyValue::new("search", req.search.clone()),
            ],
        );

        let (products, total) = match self.query.find_all(req).await {
            Ok(found) => found,
            Err(e) => {
                self.observer
                    .complete_tracing_error(&tracing_ctx, Method::Get, &e.to_string())
                    .await;
                return Err(ServiceError::Repo(e));
            }
        };

        self.observer
            .complete_tracing_success(&tracing_ctx, Method::Get, "Products fetched")
            .await;

        Ok((
            products.into_iter().map(ProductResponse::from).collect(),
            Pagination::new(req.page, req.page_size, total),
        ))
    }

    async fn find_by_id(&self, id: i32) -> Result<ProductResponse, ServiceError> {
        self.query
            .find_by_id(id)
            .await?
            .map(ProductResponse::from)
            .ok_or_else(|| ServiceError::NotFound(PRODUCT_NOT_FOUND.to_string()))
    }
}

pub struct ProductCommandService {
    query: DynProductQueryRepository,
    command: DynProductCommandRepository,
    users: DynUserQueryRepository,
    observer: ServiceObserver,
}

pub struct ProductCommandServiceDeps {
    pub query: DynProductQueryRepository,
    pub command: DynProductCommandRepository,
    pub users: DynUserQueryRepository,
    pub registry: Arc<Mutex<Registry>>,
}

impl ProductCommandService {
    pub async fn new(deps: ProductCommandServiceDeps) -> Self {
        let ProductCommandServiceDeps {
            query,
            command,
            users,
            registry,
        } = deps;

        Self {
            query,
            command,
            users,
            observer: ServiceObserver::new("product-command-service", registry).await,
        }
    }

    async fn ensure_distributor(&self, distributor_id: i32) -> Result<(), ServiceError> {
        match self.users.find_by_id(distributor_id).await? {
            Some(user) if user.role == UserRole::Distributor => Ok(()),
            Some(_) => Err(ServiceError::BadRequest(format!(
                "User {distributor_id} is not a distributor."
            ))),
            None => Err(ServiceError::BadRequest(format!(
                "Distributor {distributor_id} does not exist."
            ))),
        }
    }
}

#[async_trait]
impl ProductCommandServiceTrait for ProductCommandService {
    async fn create_product(
        &self,
        req: &CreateProductRequest,
    ) -> Result<ApiResponse<ProductResponse>, ServiceError> {
        info!("🆕 Creating product {}", req.name);

        let tracing_ctx = self.observer.start_tracing(
            "CreateProduct",
            vec![
                KeyValue::new("component", "product"),
                KeyValue::new("product.name", req.name.clone()),
                KeyValue::new("product.distributor_id", req.distributor_id as i64),
            ],
        );

        if let Err(e) = self.ensure_distributor(req.distributor_id).await {
            warn!("⚠️ Rejected product {}: {e}", req.name);
            self.observer
                .complete_tracing_error(&tracing_ctx, Method::Post, &e.to_string())
                .await;
            return Err(e);
        }

        let record = ProductRecord::from(req.clone());
        let product = self
            .observer
            .trace_err(&tracing_ctx, Method::Post, self.command.create_product(&record).await)
            .await?;

        self.observer
            .complete_tracing_success(&tracing_ctx, Method::Post, "Product created")
            .await;

        Ok(ApiResponse::success(
            "Product created successfully",
            ProductResponse::from(product),
        ))
    }

    async fn update_product(
        &self,
        id: i32,
        req: &UpdateProductRequest,
    ) -> Result<ApiResponse<ProductResponse>, ServiceError> {
        info!("🔄 Updating product {id}");

        let tracing_ctx = self.observer.start_tracing(
            "UpdateProduct",
            vec![
                KeyValue::new("component", "product"),
                KeyValue::new("product.id", id as i64),
            ],
        );

        let existing = self
            .observer
            .trace_err(&tracing_ctx, Method::Put, self.query.find_by_id(id).await)
            .await?;

        if existing.is_none() {
            self.observer
                .complete_tracing_error(&tracing_ctx, Method::Put, "Product not found")
                .await;
            return Err(ServiceError::NotFound(PRODUCT_NOT_FOUND.to_string()));
        }

        if let Err(e) = self.ensure_distributor(req.distributor_id).await {
            self.observer
                .complete_tracing_error(&tracing_ctx, Method::Put, &e.to_string())
                .await;
            return Err(e);
        }

        let record = ProductRecord::from(req.clone());
        let product = self
            .observer
            .trace_err(
                &tracing_ctx,
                Method::Put,
                self.command.update_product(id, &record).await,
            )
            .await?;

        self.observer
            .complete_tracing_success(&tracing_ctx, Method::Put, "Product updated")
            .await;

        Ok(ApiResponse::success(
            "Product updated successfully",
            ProductResponse::from(product),
        ))
    }

    async fn delete_product(&self, id: i32) -> Result<ApiResponse<()>, ServiceError> {
        let tracing_ctx = self.observer.start_tracing(
            "DeleteProduct",
            vec![
                KeyValue::new("component", "product"),
                KeyValue::new("product.id", id as i64),
            ],
        );

        let result = self.command.delete_product(id).await.map_err(|e| match e {
            RepositoryError::NotFound => ServiceError::NotFound(PRODUCT_NOT_FOUND.to_string()),
            RepositoryError::ForeignKey(_) => ServiceError::BadRequest(
                "Product is referenced by existing quotations or orders.".to_string(),
            ),
            other => ServiceError::Repo(other),
        });

        match result {
            Ok(()) => {
                self.observer
                    .complete_tracing_success(&tracing_ctx, Method::Delete, "Product deleted")
                    .await;
                Ok(ApiResponse::success("Product deleted successfully", ()))
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::requests::product::{DEFAULT_CATEGORY, DEFAULT_IMAGE_URL},
        test_support::TestContext,
    };
    use rust_decimal_macros::dec;

    fn create_request(distributor_id: i32) -> CreateProductRequest {
        CreateProductRequest {
            name: "Galaxy Buds".into(),
            description: "Wireless earbuds".into(),
            price: dec!(149.99),
            stock_quantity: 10,
            category: None,
            distributor_id,
            image_url: None,
        }
    }

    #[tokio::test]
    async fn create_applies_defaults() {
        let ctx = TestContext::new().await;
        let distributor = ctx
            .store
            .seed_user("Dist", "d@example.com", UserRole::Distributor);

        let created = ctx
            .product_command
            .create_product(&create_request(distributor.id))
            .await
            .unwrap();

        assert_eq!(created.data.category, DEFAULT_CATEGORY);
        assert_eq!(created.data.image_url, DEFAULT_IMAGE_URL);
        assert_eq!(created.data.price, dec!(149.99));
    }

    #[tokio::test]
    async fn create_requires_an_existing_distributor() {
        let ctx = TestContext::new().await;
        let customer = ctx
            .store
            .seed_user("Cust", "c@example.com", UserRole::Customer);

        let not_distributor = ctx
            .product_command
            .create_product(&create_request(customer.id))
            .await
            .unwrap_err();
        let missing = ctx
            .product_command
            .create_product(&create_request(4242))
            .await
            .unwrap_err();

        assert!(matches!(not_distributor, ServiceError::BadRequest(_)));
        assert!(matches!(missing, ServiceError::BadRequest(_)));
    }

    #[tokio::test]
    async fn missing_product_is_not_found() {
        let ctx = TestContext::new().await;

        let err = ctx.product_query.find_by_id(77).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(ref m) if m == "Product not found."));

        let err = ctx.product_command.delete_product(77).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn find_all_filters_by_category_and_search() {
        let ctx = TestContext::new().await;
        let distributor = ctx
            .store
            .seed_user("Dist", "d@example.com", UserRole::Distributor);
        let phone = ctx.store.seed_product("Pixel 9", "699.00", 3, distributor.id);
        ctx.store.set_category(phone.id, "Phones");
        ctx.store.seed_product("Pixel Buds", "99.00", 3, distributor.id);
        ctx.store.seed_product("Surface Pen", "59.00", 3, distributor.id);

        let (pixels, pagination) = ctx
            .product_query
            .find_all(&FindAllProducts {
                search: "pixel".into(),
                ..FindAllProducts::default()
            })
            .await
            .unwrap();
        assert_eq!(pixels.len(), 2);
        assert_eq!(pagination.total_items, 2);

        let (phones, _) = ctx
            .product_query
            .find_all(&FindAllProducts {
                category: Some("Phones".into()),
                ..FindAllProducts::default()
            })
            .await
            .unwrap();
        assert_eq!(phones.len(), 1);
        assert_eq!(phones[0].id, phone.id);
    }
}
