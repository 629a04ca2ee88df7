use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// A posted income or expense. Positive amounts are income, negative are spending.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub id: uuid::Uuid,
    pub user_id: Option<uuid::Uuid>,
    pub account_id: Option<uuid::Uuid>,
    pub amount: BigDecimal,
    pub category: String,
    pub description: Option<String>,
    pub transaction_date: NaiveDate,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTransaction {
    pub account_id: uuid::Uuid,
    pub amount: BigDecimal,
    pub category: Option<String>,
    pub description: Option<String>,
    pub transaction_date: NaiveDate,
}

impl Transaction {
    pub fn new(user_id: uuid::Uuid, data: CreateTransaction) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            user_id: Some(user_id),
            account_id: Some(data.account_id),
            amount: data.amount,
            category: data.category.unwrap_or_else(|| "Uncategorized".to_string()),
            description: data.description,
            transaction_date: data.transaction_date,
            created_at: chrono::Utc::now(),
        }
    }
}
