use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;
use crate::models::{Goal, GoalAllocation};

const GOAL_COLUMNS: &str = "id, user_id, name, category, priority, target_amount, current_amount, target_date,
                            linked_account_id, is_account_backed, is_completed, created_at";

pub async fn fetch_all(pool: &PgPool) -> Result<Vec<Goal>, sqlx::Error> {
    let goals = sqlx::query_as::<_, Goal>(&format!(
        "SELECT {GOAL_COLUMNS} FROM goals ORDER BY created_at"
    ))
    .fetch_all(pool)
    .await?;
    attach_allocations(pool, goals).await
}

pub async fn fetch_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Goal>, sqlx::Error> {
    let goals = sqlx::query_as::<_, Goal>(&format!(
        "SELECT {GOAL_COLUMNS} FROM goals WHERE user_id = $1 ORDER BY created_at"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    attach_allocations(pool, goals).await
}

pub async fn fetch_one(pool: &PgPool, id: Uuid) -> Result<Option<Goal>, sqlx::Error> {
    let goal = sqlx::query_as::<_, Goal>(&format!(
        "SELECT {GOAL_COLUMNS} FROM goals WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match goal {
        Some(goal) => Ok(attach_allocations(pool, vec![goal]).await?.pop()),
        None => Ok(None),
    }
}

async fn attach_allocations(pool: &PgPool, mut goals: Vec<Goal>) -> Result<Vec<Goal>, sqlx::Error> {
    if goals.is_empty() {
        return Ok(goals);
    }
    let ids: Vec<Uuid> = goals.iter().map(|g| g.id).collect();
    let allocations = sqlx::query_as::<_, GoalAllocation>(
        "SELECT goal_id, account_id, allocated_amount, last_updated
         FROM goal_allocations
         WHERE goal_id = ANY($1)
         ORDER BY last_updated"
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    for allocation in allocations {
        if let Some(goal) = goals.iter_mut().find(|g| g.id == allocation.goal_id) {
            goal.allocations.push(allocation);
        }
    }
    Ok(goals)
}

/// Every allocation against the given accounts, across all goals.
pub async fn fetch_allocations_for_accounts(
    pool: &PgPool,
    account_ids: &[Uuid],
) -> Result<Vec<GoalAllocation>, sqlx::Error> {
    if account_ids.is_empty() {
        return Ok(Vec::new());
    }
    sqlx::query_as::<_, GoalAllocation>(
        "SELECT goal_id, account_id, allocated_amount, last_updated
         FROM goal_allocations
         WHERE account_id = ANY($1)"
    )
    .bind(account_ids)
    .fetch_all(pool)
    .await
}

/// Insert the goal row only. Returns false when it already exists.
pub async fn insert<'e, E: PgExecutor<'e>>(executor: E, goal: &Goal) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO goals (id, user_id, name, category, priority, target_amount, current_amount,
                            target_date, linked_account_id, is_account_backed, is_completed, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
         ON CONFLICT (id) DO NOTHING"
    )
    .bind(goal.id)
    .bind(goal.user_id)
    .bind(&goal.name)
    .bind(&goal.category)
    .bind(&goal.priority)
    .bind(&goal.target_amount)
    .bind(&goal.current_amount)
    .bind(goal.target_date)
    .bind(goal.linked_account_id)
    .bind(goal.is_account_backed)
    .bind(goal.is_completed)
    .bind(goal.created_at)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn insert_allocation<'e, E: PgExecutor<'e>>(
    executor: E,
    allocation: &GoalAllocation,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO goal_allocations (goal_id, account_id, allocated_amount, last_updated)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (goal_id, account_id) DO NOTHING"
    )
    .bind(allocation.goal_id)
    .bind(allocation.account_id)
    .bind(&allocation.allocated_amount)
    .bind(allocation.last_updated)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Persist a goal and replace its allocation records atomically.
/// The caller must have run `Goal::refresh_derived` first.
pub async fn save(pool: &PgPool, goal: &Goal) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "UPDATE goals
         SET target_amount = $1, current_amount = $2, linked_account_id = $3,
             is_account_backed = $4, is_completed = $5
         WHERE id = $6"
    )
    .bind(&goal.target_amount)
    .bind(&goal.current_amount)
    .bind(goal.linked_account_id)
    .bind(goal.is_account_backed)
    .bind(goal.is_completed)
    .bind(goal.id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM goal_allocations WHERE goal_id = $1")
        .bind(goal.id)
        .execute(&mut *tx)
        .await?;

    for allocation in &goal.allocations {
        insert_allocation(&mut *tx, allocation).await?;
    }

    tx.commit().await?;
    Ok(())
}
