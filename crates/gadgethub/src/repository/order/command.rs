use super::query::ORDER_COLUMNS;
use crate::{
    abstract_trait::order::OrderCommandRepositoryTrait,
    domain::requests::order::CheckoutRecord,
    model::{
        order::{DEFAULT_ORDER_STATUS, Order},
        quotation::QuotationStatus,
    },
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::{config::ConnectionPool, errors::RepositoryError};
use sqlx::FromRow;
use tracing::{error, info, warn};

#[derive(FromRow)]
struct QuotedLine {
    product_id: i32,
    product_name: String,
    quantity: i32,
    offered_unit_price: Decimal,
}

#[derive(Clone)]
pub struct OrderCommandRepository {
    db: ConnectionPool,
}

impl OrderCommandRepository {
    pub fn new(db: ConnectionPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OrderCommandRepositoryTrait for OrderCommandRepository {
    async fn checkout(&self, req: &CheckoutRecord) -> Result<Order, RepositoryError> {
        let mut tx = self.db.begin().await.map_err(RepositoryError::from)?;

        // The conditional update takes the row lock, so a concurrent checkout
        // of the same quotation blocks here and then matches zero rows.
        let converted = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE quotations
            SET status = $4, updated_at = $3
            WHERE id = $1
              AND customer_id = $2
              AND status = $5
              AND expiry_date > $3
            RETURNING id
            "#,
        )
        .bind(req.quotation_id)
        .bind(req.customer_id)
        .bind(req.now)
        .bind(QuotationStatus::ConvertedToOrder)
        .bind(QuotationStatus::Approved)
        .fetch_optional(&mut *tx)
        .await
        .map_err(RepositoryError::from)?;

        if converted.is_none() {
            warn!(
                "⚠️ Quotation {} could not be converted for customer {}",
                req.quotation_id, req.customer_id
            );
            return Err(RepositoryError::Conflict(
                "Quotation is not approved.".to_string(),
            ));
        }

        let lines = sqlx::query_as::<_, QuotedLine>(
            r#"
            SELECT qi.product_id, p.name AS product_name, qi.quantity, qi.offered_unit_price
            FROM quotation_items qi
            JOIN products p ON p.id = qi.product_id
            WHERE qi.quotation_id = $1
            ORDER BY qi.product_id
            "#,
        )
        .bind(req.quotation_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(RepositoryError::from)?;

        for line in &lines {
            let updated = sqlx::query(
                r#"
                UPDATE products
                SET stock_quantity = stock_quantity - $2, updated_at = $3
                WHERE id = $1 AND stock_quantity >= $2
                "#,
            )
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(req.now)
            .execute(&mut *tx)
            .await
            .map_err(RepositoryError::from)?;

            if updated.rows_affected() == 0 {
                warn!(
                    "⚠️ Insufficient stock for product {} while converting quotation {}",
                    line.product_id, req.quotation_id
                );
                return Err(RepositoryError::Conflict(format!(
                    "Insufficient stock for product '{}'.",
                    line.product_name
                )));
            }
        }

        let total_amount: Decimal = lines
            .iter()
            .map(|l| l.offered_unit_price * Decimal::from(l.quantity))
            .sum();

        let sql = format!(
            r#"
            INSERT INTO orders (customer_id, order_date, total_amount, status, from_quotation_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ORDER_COLUMNS}
            "#
        );

        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(req.customer_id)
            .bind(req.now)
            .bind(total_amount)
            .bind(DEFAULT_ORDER_STATUS)
            .bind(req.quotation_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                error!(
                    "❌ Failed to create order from quotation {}: {:?}",
                    req.quotation_id, e
                );
                RepositoryError::from(e)
            })?;

        for line in &lines {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, product_id, quantity, unit_price)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(order.id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.offered_unit_price)
            .execute(&mut *tx)
            .await
            .map_err(RepositoryError::from)?;
        }

        tx.commit().await.map_err(RepositoryError::from)?;

        info!(
            "✅ Created order {} from quotation {} (total {})",
            order.id, req.quotation_id, order.total_amount
        );
        Ok(order)
    }

    async fn update_status(&self, id: i32, status: &str) -> Result<Order, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let sql = format!("UPDATE orders SET status = $2 WHERE id = $1 RETURNING {ORDER_COLUMNS}");

        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .bind(status)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| {
                error!("❌ Failed to update status of order {}: {:?}", id, e);
                RepositoryError::from(e)
            })?;

        info!("🔄 Order {} status set to {}", order.id, order.status);
        Ok(order)
    }

    async fn delete_order(&self, id: i32) -> Result<(), RepositoryError> {
        info!("❌ Deleting order: {}", id);

        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                error!("❌ Failed to delete order {}: {:?}", id, e);
                RepositoryError::from(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
