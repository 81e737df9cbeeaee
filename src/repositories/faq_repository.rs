use crate::models::faq::Faq;
use crate::repositories::user_repository::RepositoryResult;
use async_trait::async_trait;
use sqlx::SqlitePool;

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait FaqRepository: Send + Sync {
    async fn create_faq(&self, question: &str, answer: &str) -> RepositoryResult<Faq>;
    async fn list_faqs(&self) -> RepositoryResult<Vec<Faq>>;
}

pub struct SqliteFaqRepository {
    pool: SqlitePool,
}

impl SqliteFaqRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FaqRepository for SqliteFaqRepository {
    async fn create_faq(&self, question: &str, answer: &str) -> RepositoryResult<Faq> {
        let faq = sqlx::query_as::<_, Faq>(
            "INSERT INTO faqs (question, answer) VALUES (?, ?) RETURNING id, question, answer",
        )
        .bind(question)
        .bind(answer)
        .fetch_one(&self.pool)
        .await?;

        Ok(faq)
    }

    async fn list_faqs(&self) -> RepositoryResult<Vec<Faq>> {
        let faqs = sqlx::query_as::<_, Faq>("SELECT id, question, answer FROM faqs ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(faqs)
    }
}
