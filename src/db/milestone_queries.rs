use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;
use crate::models::NetWorthMilestone;

/// Milestones are append-only; there is no update or delete.
pub async fn insert<'e, E: PgExecutor<'e>>(
    executor: E,
    m: &NetWorthMilestone,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO net_worth_milestones
         (id, user_id, recorded_at, trigger, net_worth, liquid_assets, portfolio_value,
          physical_assets, total_liabilities)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         ON CONFLICT (id) DO NOTHING"
    )
    .bind(m.id)
    .bind(m.user_id)
    .bind(m.recorded_at)
    .bind(&m.trigger)
    .bind(&m.net_worth)
    .bind(&m.liquid_assets)
    .bind(&m.portfolio_value)
    .bind(&m.physical_assets)
    .bind(&m.total_liabilities)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// A user's milestones recorded at or after `since`, oldest first.
pub async fn fetch_for_user_since(
    pool: &PgPool,
    user_id: Uuid,
    since: DateTime<Utc>,
) -> Result<Vec<NetWorthMilestone>, sqlx::Error> {
    sqlx::query_as::<_, NetWorthMilestone>(
        "SELECT id, user_id, recorded_at, trigger, net_worth, liquid_assets, portfolio_value,
                physical_assets, total_liabilities
         FROM net_worth_milestones
         WHERE user_id = $1 AND recorded_at >= $2
         ORDER BY recorded_at ASC"
    )
    .bind(user_id)
    .bind(since)
    .fetch_all(pool)
    .await
}

pub async fn fetch_all(pool: &PgPool) -> Result<Vec<NetWorthMilestone>, sqlx::Error> {
    sqlx::query_as::<_, NetWorthMilestone>(
        "SELECT id, user_id, recorded_at, trigger, net_worth, liquid_assets, portfolio_value,
                physical_assets, total_liabilities
         FROM net_worth_milestones
         ORDER BY recorded_at ASC"
    )
    .fetch_all(pool)
    .await
}
