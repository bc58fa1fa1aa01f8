use crate::{
    abstract_trait::cart::CartRepositoryTrait,
    model::cart_item::{CartItem, CartLine},
};
use async_trait::async_trait;
use shared::{config::ConnectionPool, errors::RepositoryError};
use tracing::{error, info};

#[derive(Clone)]
pub struct CartRepository {
    db: ConnectionPool,
}

impl CartRepository {
    pub fn new(db: ConnectionPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CartRepositoryTrait for CartRepository {
    async fn find_by_user(&self, user_id: i32) -> Result<Vec<CartLine>, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let lines = sqlx::query_as::<_, CartLine>(
            r#"
            SELECT c.id, c.product_id, p.name AS product_name, p.price AS unit_price,
                   c.quantity, p.stock_quantity, p.distributor_id
            FROM cart_items c
            JOIN products p ON p.id = c.product_id
            WHERE c.user_id = $1
            ORDER BY c.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| {
            error!("❌ Failed to fetch cart for user {}: {:?}", user_id, e);
            RepositoryError::from(e)
        })?;

        Ok(lines)
    }

    async fn find_item(
        &self,
        user_id: i32,
        product_id: i32,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let item = sqlx::query_as::<_, CartItem>(
            r#"
            SELECT id, user_id, product_id, quantity
            FROM cart_items
            WHERE user_id = $1 AND product_id = $2
            "#,
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(RepositoryError::from)?;

        Ok(item)
    }

    async fn add_quantity(
        &self,
        user_id: i32,
        product_id: i32,
        quantity: i32,
    ) -> Result<CartItem, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let item = sqlx::query_as::<_, CartItem>(
            r#"
            INSERT INTO cart_items (user_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity
            RETURNING id, user_id, product_id, quantity
            "#,
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| {
            error!(
                "❌ Failed to add product {} to cart of user {}: {:?}",
                product_id, user_id, e
            );
            RepositoryError::from(e)
        })?;

        info!(
            "🛒 Cart item {} for user {} now holds {} x product {}",
            item.id, user_id, item.quantity, product_id
        );
        Ok(item)
    }

    async fn remove_item(&self, user_id: i32, item_id: i32) -> Result<bool, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2")
            .bind(item_id)
            .bind(user_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                error!("❌ Failed to remove cart item {}: {:?}", item_id, e);
                RepositoryError::from(e)
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear(&self, user_id: i32) -> Result<u64, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                error!("❌ Failed to clear cart of user {}: {:?}", user_id, e);
                RepositoryError::from(e)
            })?;

        info!("🧹 Cleared {} cart rows for user {}", result.rows_affected(), user_id);
        Ok(result.rows_affected())
    }
}
