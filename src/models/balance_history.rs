use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// One allocation or deallocation event between a goal and an account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GoalBalanceChange {
    pub id: uuid::Uuid,
    pub goal_id: uuid::Uuid,
    pub account_id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub amount: BigDecimal,
    pub is_allocation: bool,
    pub note: String,
    pub recorded_at: chrono::DateTime<chrono::Utc>,
}
