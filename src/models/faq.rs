use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Faq {
    pub id: i64,
    pub question: String,
    pub answer: String,
}
