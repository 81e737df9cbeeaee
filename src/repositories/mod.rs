pub mod billing_repository;
pub mod faq_repository;
pub mod user_repository;

pub use billing_repository::{BillingRepository, SqliteBillingRepository};
pub use faq_repository::{FaqRepository, SqliteFaqRepository};
pub use user_repository::{RepositoryError, RepositoryResult, SqliteUserRepository, UserRepository};
