pub mod test_helpers {
    use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
    use tempfile::NamedTempFile;

    /// Create a new in-memory SQLite database for testing
    pub async fn create_test_db() -> Result<SqlitePool, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&pool)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(pool)
    }

    /// Create a temporary file-based SQLite database for testing
    /// Useful when several connections must see the same data
    pub async fn create_test_db_file() -> Result<(SqlitePool, NamedTempFile), sqlx::Error> {
        let temp_file = NamedTempFile::new().map_err(sqlx::Error::Io)?;
        let db_path = temp_file
            .path()
            .to_str()
            .ok_or_else(|| sqlx::Error::Configuration("Invalid database path".into()))?;
        let database_url = format!("sqlite://{}", db_path);

        let pool = crate::db::create_pool(&database_url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok((pool, temp_file))
    }
}

pub mod test_email {
    use crate::services::email_service::{EmailError, EmailService};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum EmailKind {
        Activation,
        PasswordReset,
    }

    #[derive(Debug, Clone)]
    pub struct SentEmail {
        pub kind: EmailKind,
        pub to: String,
        pub token: String,
    }

    /// Keeps every message in memory so tests can read the tokens back.
    #[derive(Default)]
    pub struct RecordingEmailService {
        sent: Mutex<Vec<SentEmail>>,
    }

    impl RecordingEmailService {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn sent(&self) -> Vec<SentEmail> {
            self.sent
                .lock()
                .map(|sent| sent.clone())
                .unwrap_or_default()
        }

        pub fn last_token_for(&self, to: &str, kind: EmailKind) -> Option<String> {
            self.sent()
                .into_iter()
                .rev()
                .find(|email| email.to == to && email.kind == kind)
                .map(|email| email.token)
        }

        fn record(&self, kind: EmailKind, to: &str, token: &str) -> Result<(), EmailError> {
            let mut sent = self
                .sent
                .lock()
                .map_err(|e| EmailError::SendFailed(e.to_string()))?;
            sent.push(SentEmail {
                kind,
                to: to.to_string(),
                token: token.to_string(),
            });
            Ok(())
        }
    }

    #[async_trait]
    impl EmailService for RecordingEmailService {
        async fn send_activation_email(
            &self,
            to_email: &str,
            token: &str,
        ) -> Result<(), EmailError> {
            self.record(EmailKind::Activation, to_email, token)
        }

        async fn send_password_reset_email(
            &self,
            to_email: &str,
            token: &str,
        ) -> Result<(), EmailError> {
            self.record(EmailKind::PasswordReset, to_email, token)
        }
    }
}

pub mod test_app {
    use super::test_email::RecordingEmailService;
    use crate::config::session::SessionConfig;
    use crate::repositories::{
        BillingRepository, FaqRepository, SqliteBillingRepository, SqliteFaqRepository,
        SqliteUserRepository, UserRepository,
    };
    use crate::services::{Clock, TokenPolicy};
    use crate::{routes, AppState};
    use axum::Router;
    use sqlx::SqlitePool;
    use std::sync::Arc;
    use tower_sessions_sqlx_store::SqliteStore;

    /// Router plus direct handles on the store and captured mail.
    pub struct TestApp {
        pub router: Router,
        pub state: AppState,
        pub emails: Arc<RecordingEmailService>,
        pub users: Arc<dyn UserRepository>,
        pub billing: Arc<dyn BillingRepository>,
        pub faqs: Arc<dyn FaqRepository>,
    }

    pub async fn create_test_app(
        pool: SqlitePool,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<TestApp> {
        let emails = Arc::new(RecordingEmailService::new());
        let state = AppState::build(pool.clone(), emails.clone(), TokenPolicy::default(), clock);

        let session_store = SqliteStore::new(pool.clone())
            .with_table_name("sessions")
            .map_err(anyhow::Error::msg)?;
        session_store.migrate().await?;
        let session_layer = SessionConfig::for_environment(false, None).create_layer(session_store);

        Ok(TestApp {
            router: routes::build_router(state.clone(), session_layer),
            state,
            emails,
            users: Arc::new(SqliteUserRepository::new(pool.clone())),
            billing: Arc::new(SqliteBillingRepository::new(pool.clone())),
            faqs: Arc::new(SqliteFaqRepository::new(pool)),
        })
    }
}

// Note: This is test-only code. Panic on error is acceptable in tests.
#[cfg(test)]
pub async fn create_test_pool() -> sqlx::SqlitePool {
    match test_helpers::create_test_db().await {
        Ok(pool) => pool,
        Err(e) => panic!("Failed to create test pool: {}", e),
    }
}

pub use test_app::{create_test_app, TestApp};
pub use test_email::{EmailKind, RecordingEmailService, SentEmail};
