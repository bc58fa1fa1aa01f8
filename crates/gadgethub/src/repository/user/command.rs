use crate::{
    abstract_trait::user::UserCommandRepositoryTrait,
    domain::requests::user::{CreateUserRecord, UpdateUserRecord},
    model::user::User as UserModel,
};
use async_trait::async_trait;
use chrono::Utc;
use shared::{config::ConnectionPool, errors::RepositoryError};
use tracing::{error, info};

#[derive(Clone)]
pub struct UserCommandRepository {
    db: ConnectionPool,
}

impl UserCommandRepository {
    pub fn new(db: ConnectionPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserCommandRepositoryTrait for UserCommandRepository {
    async fn create_user(&self, req: &CreateUserRecord) -> Result<UserModel, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let user = sqlx::query_as::<_, UserModel>(
            r#"
            INSERT INTO users (first_name, last_name, email, password, role, company_name, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, first_name, last_name, email, password, role, company_name, created_at
            "#,
        )
        .bind(&req.first_name)
        .bind(&req.last_name)
        .bind(&req.email)
        .bind(&req.password)
        .bind(req.role)
        .bind(&req.company_name)
        .bind(Utc::now().naive_utc())
        .fetch_one(&mut *conn)
        .await
        .map_err(|err| {
            error!("❌ Failed to create user {}: {:?}", req.email, err);
            RepositoryError::from(err)
        })?;

        info!("✅ Created {} user ID {}", user.role, user.id);
        Ok(user)
    }

    async fn update_user(&self, req: &UpdateUserRecord) -> Result<UserModel, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let user = sqlx::query_as::<_, UserModel>(
            r#"
            UPDATE users
            SET first_name   = $2,
                last_name    = $3,
                role         = $4,
                company_name = $5
            WHERE id = $1
            RETURNING id, first_name, last_name, email, password, role, company_name, created_at
            "#,
        )
        .bind(req.id)
        .bind(&req.first_name)
        .bind(&req.last_name)
        .bind(req.role)
        .bind(&req.company_name)
        .fetch_one(&mut *conn)
        .await
        .map_err(|err| {
            error!("❌ Failed to update user ID {}: {:?}", req.id, err);
            RepositoryError::from(err)
        })?;

        info!("🔄 Updated user ID {}", user.id);
        Ok(user)
    }

    async fn delete_user(&self, id: i32) -> Result<(), RepositoryError> {
        info!("❌ Deleting user: {}", id);

        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                error!("❌ Failed to delete user {}: {:?}", id, e);
                RepositoryError::from(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
