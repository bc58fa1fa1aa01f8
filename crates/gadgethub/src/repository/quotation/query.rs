use crate::{
    abstract_trait::quotation::QuotationQueryRepositoryTrait,
    model::{quotation::Quotation, quotation_item::QuotationItem},
};
use async_trait::async_trait;
use shared::{config::ConnectionPool, errors::RepositoryError};
use tracing::{error, info};

pub(crate) const QUOTATION_COLUMNS: &str =
    "id, customer_id, distributor_id, expiry_date, status, grand_total, created_at, updated_at";

#[derive(Clone)]
pub struct QuotationQueryRepository {
    db: ConnectionPool,
}

impl QuotationQueryRepository {
    pub fn new(db: ConnectionPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl QuotationQueryRepositoryTrait for QuotationQueryRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<Quotation>, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let sql = format!("SELECT {QUOTATION_COLUMNS} FROM quotations WHERE id = $1");

        let quotation = sqlx::query_as::<_, Quotation>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| {
                error!("❌ Failed to fetch quotation {}: {:?}", id, e);
                RepositoryError::from(e)
            })?;

        Ok(quotation)
    }

    async fn find_by_customer(&self, customer_id: i32) -> Result<Vec<Quotation>, RepositoryError> {
        info!("📄 Fetching quotations for customer {}", customer_id);

        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let sql = format!(
            "SELECT {QUOTATION_COLUMNS} FROM quotations WHERE customer_id = $1 ORDER BY created_at DESC, id DESC"
        );

        let quotations = sqlx::query_as::<_, Quotation>(&sql)
            .bind(customer_id)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| {
                error!(
                    "❌ Failed to fetch quotations for customer {}: {:?}",
                    customer_id, e
                );
                RepositoryError::from(e)
            })?;

        Ok(quotations)
    }

    async fn find_pending(
        &self,
        distributor_id: Option<i32>,
    ) -> Result<Vec<Quotation>, RepositoryError> {
        info!("📄 Fetching pending quotations for distributor {:?}", distributor_id);

        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let sql = format!(
            r#"
            SELECT {QUOTATION_COLUMNS}
            FROM quotations
            WHERE status = 'Pending'
              AND ($1::int IS NULL OR distributor_id = $1)
            ORDER BY created_at DESC, id DESC
            "#
        );

        let quotations = sqlx::query_as::<_, Quotation>(&sql)
            .bind(distributor_id)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| {
                error!("❌ Failed to fetch pending quotations: {:?}", e);
                RepositoryError::from(e)
            })?;

        Ok(quotations)
    }

    async fn find_items(
        &self,
        quotation_ids: &[i32],
    ) -> Result<Vec<QuotationItem>, RepositoryError> {
        if quotation_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let items = sqlx::query_as::<_, QuotationItem>(
            r#"
            SELECT qi.id, qi.quotation_id, qi.product_id, p.name AS product_name,
                   qi.quantity, qi.offered_unit_price
            FROM quotation_items qi
            JOIN products p ON p.id = qi.product_id
            WHERE qi.quotation_id = ANY($1)
            ORDER BY qi.id
            "#,
        )
        .bind(quotation_ids)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| {
            error!("❌ Failed to fetch quotation items: {:?}", e);
            RepositoryError::from(e)
        })?;

        Ok(items)
    }
}
