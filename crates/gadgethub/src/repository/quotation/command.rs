use super::query::QUOTATION_COLUMNS;
use crate::{
    abstract_trait::quotation::QuotationCommandRepositoryTrait,
    domain::requests::quotation::{ApproveQuotationRecord, CreateQuotationRecord},
    model::{
        cart_item::CartLine,
        quotation::{Quotation, QuotationStatus},
    },
};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use shared::{config::ConnectionPool, errors::RepositoryError};
use tracing::{error, info, warn};

pub const EMPTY_CART: &str = "Cart is empty";
pub const MIXED_DISTRIBUTORS: &str = "Cart contains products from multiple distributors";

#[derive(Clone)]
pub struct QuotationCommandRepository {
    db: ConnectionPool,
}

impl QuotationCommandRepository {
    pub fn new(db: ConnectionPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl QuotationCommandRepositoryTrait for QuotationCommandRepository {
    async fn create_from_cart(
        &self,
        req: &CreateQuotationRecord,
    ) -> Result<Quotation, RepositoryError> {
        let mut tx = self.db.begin().await.map_err(RepositoryError::from)?;

        let lines = sqlx::query_as::<_, CartLine>(
            r#"
            SELECT c.id, c.product_id, p.name AS product_name, p.price AS unit_price,
                   c.quantity, p.stock_quantity, p.distributor_id
            FROM cart_items c
            JOIN products p ON p.id = c.product_id
            WHERE c.user_id = $1
            ORDER BY c.id
            FOR UPDATE OF c
            "#,
        )
        .bind(req.customer_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(RepositoryError::from)?;

        let Some(first) = lines.first() else {
            warn!("⚠️ Customer {} requested a quotation with an empty cart", req.customer_id);
            return Err(RepositoryError::Conflict(EMPTY_CART.to_string()));
        };

        let distributor_id = first.distributor_id;
        if lines.iter().any(|l| l.distributor_id != distributor_id) {
            warn!(
                "⚠️ Customer {} cart spans multiple distributors",
                req.customer_id
            );
            return Err(RepositoryError::Conflict(MIXED_DISTRIBUTORS.to_string()));
        }

        let grand_total: Decimal = lines.iter().map(CartLine::line_total).sum();

        let sql = format!(
            r#"
            INSERT INTO quotations
                (customer_id, distributor_id, expiry_date, status, grand_total, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING {QUOTATION_COLUMNS}
            "#
        );

        let quotation = sqlx::query_as::<_, Quotation>(&sql)
            .bind(req.customer_id)
            .bind(distributor_id)
            .bind(req.expiry_date)
            .bind(QuotationStatus::Pending)
            .bind(grand_total)
            .bind(req.now)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                error!("❌ Failed to insert quotation: {:?}", e);
                RepositoryError::from(e)
            })?;

        for line in &lines {
            sqlx::query(
                r#"
                INSERT INTO quotation_items (quotation_id, product_id, quantity, offered_unit_price)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(quotation.id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price)
            .execute(&mut *tx)
            .await
            .map_err(RepositoryError::from)?;
        }

        sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(req.customer_id)
            .execute(&mut *tx)
            .await
            .map_err(RepositoryError::from)?;

        tx.commit().await.map_err(RepositoryError::from)?;

        info!(
            "📝 Created quotation {} for customer {} with {} items",
            quotation.id,
            req.customer_id,
            lines.len()
        );
        Ok(quotation)
    }

    async fn approve(&self, req: &ApproveQuotationRecord) -> Result<Quotation, RepositoryError> {
        let mut tx = self.db.begin().await.map_err(RepositoryError::from)?;

        let sql = format!("SELECT {QUOTATION_COLUMNS} FROM quotations WHERE id = $1 FOR UPDATE");
        let quotation = sqlx::query_as::<_, Quotation>(&sql)
            .bind(req.quotation_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(RepositoryError::from)?
            .ok_or(RepositoryError::NotFound)?;

        if quotation.status != QuotationStatus::Pending {
            return Err(RepositoryError::Conflict(format!(
                "Quotation is {} and can no longer be approved.",
                quotation.status
            )));
        }

        if quotation.is_expired(req.now) {
            return Err(RepositoryError::Conflict(
                "Quotation has expired.".to_string(),
            ));
        }

        for update in &req.prices {
            if update.negotiated_price < Decimal::ZERO {
                return Err(RepositoryError::Conflict(format!(
                    "Negotiated price for product {} cannot be negative.",
                    update.product_id
                )));
            }

            let result = sqlx::query(
                r#"
                UPDATE quotation_items
                SET offered_unit_price = $3
                WHERE quotation_id = $1 AND product_id = $2
                "#,
            )
            .bind(req.quotation_id)
            .bind(update.product_id)
            .bind(update.negotiated_price)
            .execute(&mut *tx)
            .await
            .map_err(RepositoryError::from)?;

            if result.rows_affected() == 0 {
                return Err(RepositoryError::Conflict(format!(
                    "Product {} is not part of this quotation.",
                    update.product_id
                )));
            }
        }

        let sql = format!(
            r#"
            UPDATE quotations
            SET grand_total = (
                    SELECT COALESCE(SUM(quantity * offered_unit_price), 0)
                    FROM quotation_items
                    WHERE quotation_id = $1
                ),
                status = $2,
                updated_at = $3
            WHERE id = $1
            RETURNING {QUOTATION_COLUMNS}
            "#
        );

        let approved = sqlx::query_as::<_, Quotation>(&sql)
            .bind(req.quotation_id)
            .bind(QuotationStatus::Approved)
            .bind(req.now)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                error!("❌ Failed to approve quotation {}: {:?}", req.quotation_id, e);
                RepositoryError::from(e)
            })?;

        tx.commit().await.map_err(RepositoryError::from)?;

        info!(
            "✅ Approved quotation {} with grand total {}",
            approved.id, approved.grand_total
        );
        Ok(approved)
    }

    async fn reject(&self, id: i32) -> Result<Quotation, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let sql = format!(
            r#"
            UPDATE quotations
            SET status = $2, updated_at = $4
            WHERE id = $1 AND status = $3
            RETURNING {QUOTATION_COLUMNS}
            "#
        );

        let rejected = sqlx::query_as::<_, Quotation>(&sql)
            .bind(id)
            .bind(QuotationStatus::Rejected)
            .bind(QuotationStatus::Pending)
            .bind(Utc::now().naive_utc())
            .fetch_optional(&mut *conn)
            .await
            .map_err(RepositoryError::from)?
            .ok_or_else(|| {
                RepositoryError::Conflict("Only pending quotations can be rejected.".to_string())
            })?;

        info!("🚫 Rejected quotation {}", rejected.id);
        Ok(rejected)
    }
}
