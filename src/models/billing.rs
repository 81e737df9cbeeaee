use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct BillingAddress {
    pub id: i64,
    pub user_id: i64,
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip_code: String,
    pub is_default: bool,
}

#[derive(Debug, Clone)]
pub struct NewBillingAddress {
    pub user_id: i64,
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip_code: String,
    pub is_default: bool,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    pub id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}
