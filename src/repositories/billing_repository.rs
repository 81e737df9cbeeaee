use crate::models::billing::{BillingAddress, NewBillingAddress, Payment};
use crate::repositories::user_repository::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait BillingRepository: Send + Sync {
    async fn create_address(&self, address: &NewBillingAddress)
        -> RepositoryResult<BillingAddress>;
    async fn list_addresses(&self, user_id: i64) -> RepositoryResult<Vec<BillingAddress>>;
    async fn create_payment(&self, user_id: i64) -> RepositoryResult<Payment>;
    async fn list_payments(&self, user_id: i64) -> RepositoryResult<Vec<Payment>>;
}

pub struct SqliteBillingRepository {
    pool: SqlitePool,
}

impl SqliteBillingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BillingRepository for SqliteBillingRepository {
    async fn create_address(
        &self,
        address: &NewBillingAddress,
    ) -> RepositoryResult<BillingAddress> {
        let row = sqlx::query_as::<_, BillingAddress>(
            r#"
            INSERT INTO billing_addresses (user_id, address, city, state, country, zip_code, is_default)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id, user_id, address, city, state, country, zip_code, is_default
            "#,
        )
        .bind(address.user_id)
        .bind(&address.address)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.country)
        .bind(&address.zip_code)
        .bind(address.is_default)
        .fetch_one(&self.pool)
        .await
        .map_err(map_missing_user)?;

        Ok(row)
    }

    async fn list_addresses(&self, user_id: i64) -> RepositoryResult<Vec<BillingAddress>> {
        let rows = sqlx::query_as::<_, BillingAddress>(
            r#"
            SELECT id, user_id, address, city, state, country, zip_code, is_default
            FROM billing_addresses
            WHERE user_id = ?
            ORDER BY is_default DESC, id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn create_payment(&self, user_id: i64) -> RepositoryResult<Payment> {
        let row = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (user_id, created_at)
            VALUES (?, ?)
            RETURNING id, user_id, created_at
            "#,
        )
        .bind(user_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(map_missing_user)?;

        Ok(row)
    }

    async fn list_payments(&self, user_id: i64) -> RepositoryResult<Vec<Payment>> {
        let rows = sqlx::query_as::<_, Payment>(
            "SELECT id, user_id, created_at FROM payments WHERE user_id = ? ORDER BY id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

// A dangling user_id trips the foreign key constraint.
fn map_missing_user(err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
            RepositoryError::NotFound
        }
        _ => RepositoryError::Database(err),
    }
}
