use crate::di::DependenciesInject;
use anyhow::Result;
use prometheus_client::registry::Registry;
use shared::{
    abstract_trait::{DynHashing, DynJwtService},
    config::{Config, ConnectionPool, Hashing, JwtConfig},
    utils::{SystemMetrics, run_metrics_collector},
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub jwt_config: DynJwtService,
    pub di_container: DependenciesInject,
    pub registry: Arc<Mutex<Registry>>,
    pub system_metrics: Arc<SystemMetrics>,
}

impl AppState {
    pub async fn new(pool: ConnectionPool, config: &Config) -> Result<Self> {
        let jwt_config = Arc::new(JwtConfig::new(&config.jwt_secret)) as DynJwtService;
        let hashing = Arc::new(Hashing::new()) as DynHashing;
        let registry = Arc::new(Mutex::new(Registry::default()));

        info!(
            "🧩 Wiring services (quotations expire after {} days)",
            config.quotation_expiry_days
        );

        let di_container = DependenciesInject::new(
            pool,
            hashing,
            jwt_config.clone(),
            config.quotation_expiry_days,
            registry.clone(),
        )
        .await;

        let state = Self::from_parts(jwt_config, di_container, registry).await;

        tokio::spawn(run_metrics_collector(state.system_metrics.clone()));

        Ok(state)
    }

    /// Assembles the state from an already-built container and registers process metrics.
    pub async fn from_parts(
        jwt_config: DynJwtService,
        di_container: DependenciesInject,
        registry: Arc<Mutex<Registry>>,
    ) -> Self {
        let system_metrics = Arc::new(SystemMetrics::new());
        system_metrics.register(&mut *registry.lock().await);

        Self {
            jwt_config,
            di_container,
            registry,
            system_metrics,
        }
    }
}
