pub mod config;
pub mod db;
pub mod error;
pub mod factories;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

// Make test_utils available for both unit tests and integration tests
pub mod test_utils;

use repositories::{FaqRepository, SqliteFaqRepository, SqliteUserRepository, UserRepository};
use services::{
    AccountService, AuthService, Clock, EmailService, TokenPolicy, UserService,
};
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub account_service: Arc<AccountService>,
    pub faq_repository: Arc<dyn FaqRepository>,
}

impl AppState {
    /// Wires the SQLite repositories and services around `pool`.
    pub fn build(
        pool: SqlitePool,
        email_service: Arc<dyn EmailService>,
        policy: TokenPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let user_repository: Arc<dyn UserRepository> =
            Arc::new(SqliteUserRepository::new(pool.clone()));
        let faq_repository: Arc<dyn FaqRepository> = Arc::new(SqliteFaqRepository::new(pool));

        let user_service = Arc::new(UserService::new(user_repository.clone(), clock.clone()));
        let auth_service = Arc::new(AuthService::new(user_repository.clone()));
        let account_service = Arc::new(AccountService::new(
            user_repository,
            user_service,
            email_service,
            policy,
            clock,
        ));

        Self {
            auth_service,
            account_service,
            faq_repository,
        }
    }
}
