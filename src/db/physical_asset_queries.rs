use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;
use crate::models::PhysicalAsset;

pub async fn fetch_all(pool: &PgPool) -> Result<Vec<PhysicalAsset>, sqlx::Error> {
    sqlx::query_as::<_, PhysicalAsset>(
        "SELECT id, user_id, name, current_value, loan_balance, lender, loan_rate, equity, is_active, created_at
         FROM physical_assets
         ORDER BY created_at"
    )
    .fetch_all(pool)
    .await
}

pub async fn fetch_active_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<PhysicalAsset>, sqlx::Error> {
    sqlx::query_as::<_, PhysicalAsset>(
        "SELECT id, user_id, name, current_value, loan_balance, lender, loan_rate, equity, is_active, created_at
         FROM physical_assets
         WHERE user_id = $1 AND is_active = TRUE
         ORDER BY created_at"
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn fetch_one(pool: &PgPool, id: Uuid) -> Result<Option<PhysicalAsset>, sqlx::Error> {
    sqlx::query_as::<_, PhysicalAsset>(
        "SELECT id, user_id, name, current_value, loan_balance, lender, loan_rate, equity, is_active, created_at
         FROM physical_assets
         WHERE id = $1"
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Returns false when an asset with the same id already exists.
pub async fn insert<'e, E: PgExecutor<'e>>(executor: E, asset: &PhysicalAsset) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO physical_assets (id, user_id, name, current_value, loan_balance, lender,
                                      loan_rate, equity, is_active, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
         ON CONFLICT (id) DO NOTHING"
    )
    .bind(asset.id)
    .bind(asset.user_id)
    .bind(&asset.name)
    .bind(&asset.current_value)
    .bind(&asset.loan_balance)
    .bind(&asset.lender)
    .bind(&asset.loan_rate)
    .bind(&asset.equity)
    .bind(asset.is_active)
    .bind(asset.created_at)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Persist an asset whose equity has already been recomputed.
pub async fn save(pool: &PgPool, asset: &PhysicalAsset) -> Result<Option<PhysicalAsset>, sqlx::Error> {
    sqlx::query_as::<_, PhysicalAsset>(
        "UPDATE physical_assets
         SET current_value = $1, loan_balance = $2, lender = $3, loan_rate = $4, equity = $5, is_active = $6
         WHERE id = $7
         RETURNING id, user_id, name, current_value, loan_balance, lender, loan_rate, equity, is_active, created_at"
    )
    .bind(&asset.current_value)
    .bind(&asset.loan_balance)
    .bind(&asset.lender)
    .bind(&asset.loan_rate)
    .bind(&asset.equity)
    .bind(asset.is_active)
    .bind(asset.id)
    .fetch_optional(pool)
    .await
}
