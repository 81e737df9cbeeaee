use crate::models::user::{NewUser, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Record not found")]
    NotFound,
    #[error("Record already exists")]
    AlreadyExists,
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

const USER_COLUMNS: &str = "id, email, user_name, password_hash, role, is_active, is_staff, \
     mobile_number, verification_token, token_creation_date, date_joined";

/// Maps a UNIQUE violation to `AlreadyExists`, everything else to `Database`.
pub(crate) fn map_unique_violation(err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            RepositoryError::AlreadyExists
        }
        _ => RepositoryError::Database(err),
    }
}

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, user: &NewUser) -> RepositoryResult<User>;
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<User>>;
    async fn find_by_verification_token(&self, token: &str) -> RepositoryResult<Option<User>>;
    /// Replaces the user's token and stamps its creation date.
    async fn issue_token(
        &self,
        id: i64,
        token: &str,
        issued_at: DateTime<Utc>,
    ) -> RepositoryResult<()>;
    /// Marks the user active and clears any outstanding token.
    async fn activate(&self, id: i64) -> RepositoryResult<()>;
    /// Activates only while `token` is still the user's current token, consuming it.
    /// `NotFound` when the token was already used or replaced.
    async fn activate_with_token(&self, id: i64, token: &str) -> RepositoryResult<()>;
    async fn update_password(&self, id: i64, password_hash: &str) -> RepositoryResult<()>;
    /// Stores a new password hash only while `token` is still current, consuming it.
    /// `NotFound` when the token was already used or replaced.
    async fn reset_password(
        &self,
        id: i64,
        token: &str,
        password_hash: &str,
    ) -> RepositoryResult<()>;
    /// Clears every token issued before `cutoff`. Returns the number of users touched.
    async fn clear_tokens_issued_before(&self, cutoff: DateTime<Utc>) -> RepositoryResult<u64>;
    async fn delete_user(&self, id: i64) -> RepositoryResult<()>;
    async fn list_users(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> RepositoryResult<Vec<User>>;
}

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, column: &str, value: &str) -> RepositoryResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}

fn expect_one_row(result: sqlx::sqlite::SqliteQueryResult) -> RepositoryResult<()> {
    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create_user(&self, user: &NewUser) -> RepositoryResult<User> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (
                email, user_name, password_hash, role, is_active, is_staff,
                mobile_number, verification_token, token_creation_date, date_joined
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.email)
        .bind(&user.user_name)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.is_active)
        .bind(user.is_staff)
        .bind(&user.mobile_number)
        .bind(&user.verification_token)
        .bind(user.token_creation_date)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        self.find_by_id(result.last_insert_rowid())
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        self.find_one("email", email).await
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_verification_token(&self, token: &str) -> RepositoryResult<Option<User>> {
        self.find_one("verification_token", token).await
    }

    async fn issue_token(
        &self,
        id: i64,
        token: &str,
        issued_at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        let result = sqlx::query(
            "UPDATE users SET verification_token = ?, token_creation_date = ? WHERE id = ?",
        )
        .bind(token)
        .bind(issued_at)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        expect_one_row(result)
    }

    async fn activate(&self, id: i64) -> RepositoryResult<()> {
        let result = sqlx::query(
            "UPDATE users SET is_active = TRUE, verification_token = NULL WHERE id = ?",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        expect_one_row(result)
    }

    async fn activate_with_token(&self, id: i64, token: &str) -> RepositoryResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET is_active = TRUE, verification_token = NULL
            WHERE id = ? AND verification_token = ?
            "#,
        )
        .bind(id)
        .bind(token)
        .execute(&self.pool)
        .await?;

        expect_one_row(result)
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> RepositoryResult<()> {
        let result = sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;

        expect_one_row(result)
    }

    async fn reset_password(
        &self,
        id: i64,
        token: &str,
        password_hash: &str,
    ) -> RepositoryResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = ?, verification_token = NULL
            WHERE id = ? AND verification_token = ?
            "#,
        )
        .bind(password_hash)
        .bind(id)
        .bind(token)
        .execute(&self.pool)
        .await?;

        expect_one_row(result)
    }

    async fn clear_tokens_issued_before(&self, cutoff: DateTime<Utc>) -> RepositoryResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET verification_token = NULL
            WHERE verification_token IS NOT NULL AND token_creation_date < ?
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_user(&self, id: i64) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        expect_one_row(result)
    }

    async fn list_users(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> RepositoryResult<Vec<User>> {
        let limit = limit.unwrap_or(100);
        let offset = offset.unwrap_or(0);

        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id ASC LIMIT ? OFFSET ?");
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }
}
