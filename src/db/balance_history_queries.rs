use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;
use crate::models::GoalBalanceChange;

pub async fn insert<'e, E: PgExecutor<'e>>(
    executor: E,
    change: &GoalBalanceChange,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO goal_balance_history
         (id, goal_id, account_id, user_id, amount, is_allocation, note, recorded_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         ON CONFLICT (id) DO NOTHING"
    )
    .bind(change.id)
    .bind(change.goal_id)
    .bind(change.account_id)
    .bind(change.user_id)
    .bind(&change.amount)
    .bind(change.is_allocation)
    .bind(&change.note)
    .bind(change.recorded_at)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn fetch_for_goal(pool: &PgPool, goal_id: Uuid) -> Result<Vec<GoalBalanceChange>, sqlx::Error> {
    sqlx::query_as::<_, GoalBalanceChange>(
        "SELECT id, goal_id, account_id, user_id, amount, is_allocation, note, recorded_at
         FROM goal_balance_history
         WHERE goal_id = $1
         ORDER BY recorded_at ASC"
    )
    .bind(goal_id)
    .fetch_all(pool)
    .await
}

pub async fn fetch_all(pool: &PgPool) -> Result<Vec<GoalBalanceChange>, sqlx::Error> {
    sqlx::query_as::<_, GoalBalanceChange>(
        "SELECT id, goal_id, account_id, user_id, amount, is_allocation, note, recorded_at
         FROM goal_balance_history
         ORDER BY recorded_at ASC"
    )
    .fetch_all(pool)
    .await
}
