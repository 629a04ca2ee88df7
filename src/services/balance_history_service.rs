use async_trait::async_trait;
use bigdecimal::BigDecimal;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::db;
use crate::errors::AppError;
use crate::models::GoalBalanceChange;

/// Receives a notification every time part of an account balance is attributed
/// to, or released from, a goal.
#[async_trait]
pub trait BalanceHistoryRecorder: Send + Sync {
    async fn record_goal_balance_change(
        &self,
        goal_id: Uuid,
        account_id: Uuid,
        user_id: Uuid,
        amount: &BigDecimal,
        is_allocation: bool,
        note: &str,
    ) -> Result<(), AppError>;
}

/// Writes balance changes to the goal_balance_history table.
#[derive(Clone)]
pub struct PgBalanceHistory {
    pool: PgPool,
}

impl PgBalanceHistory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BalanceHistoryRecorder for PgBalanceHistory {
    async fn record_goal_balance_change(
        &self,
        goal_id: Uuid,
        account_id: Uuid,
        user_id: Uuid,
        amount: &BigDecimal,
        is_allocation: bool,
        note: &str,
    ) -> Result<(), AppError> {
        let change = GoalBalanceChange {
            id: Uuid::new_v4(),
            goal_id,
            account_id,
            user_id,
            amount: amount.clone(),
            is_allocation,
            note: note.to_string(),
            recorded_at: chrono::Utc::now(),
        };

        db::balance_history_queries::insert(&self.pool, &change).await?;
        info!(
            "Recorded goal balance change: goal={} account={} amount={} allocation={}",
            goal_id, account_id, amount, is_allocation
        );
        Ok(())
    }
}

pub async fn history_for_goal(pool: &PgPool, goal_id: Uuid) -> Result<Vec<GoalBalanceChange>, AppError> {
    Ok(db::balance_history_queries::fetch_for_goal(pool, goal_id).await?)
}
