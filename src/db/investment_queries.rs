use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;
use crate::models::Investment;

pub async fn fetch_all(pool: &PgPool) -> Result<Vec<Investment>, sqlx::Error> {
    sqlx::query_as::<_, Investment>(
        "SELECT id, user_id, symbol, shares, last_known_price, last_price_at, is_active, created_at
         FROM investments
         ORDER BY created_at"
    )
    .fetch_all(pool)
    .await
}

pub async fn fetch_active_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Investment>, sqlx::Error> {
    sqlx::query_as::<_, Investment>(
        "SELECT id, user_id, symbol, shares, last_known_price, last_price_at, is_active, created_at
         FROM investments
         WHERE user_id = $1 AND is_active = TRUE
         ORDER BY symbol"
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Distinct symbols held by any active investment.
pub async fn fetch_held_symbols(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT symbol FROM investments WHERE is_active = TRUE ORDER BY symbol"
    )
    .fetch_all(pool)
    .await
}

/// Returns false when an investment with the same id already exists.
pub async fn insert<'e, E: PgExecutor<'e>>(executor: E, inv: &Investment) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO investments (id, user_id, symbol, shares, last_known_price, last_price_at, is_active, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         ON CONFLICT (id) DO NOTHING"
    )
    .bind(inv.id)
    .bind(inv.user_id)
    .bind(&inv.symbol)
    .bind(&inv.shares)
    .bind(&inv.last_known_price)
    .bind(inv.last_price_at)
    .bind(inv.is_active)
    .bind(inv.created_at)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Refresh the cached last-known price on every position in a symbol.
pub async fn update_cached_price(
    pool: &PgPool,
    symbol: &str,
    price: &BigDecimal,
    priced_at: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE investments
         SET last_known_price = $1, last_price_at = $2
         WHERE symbol = $3"
    )
    .bind(price)
    .bind(priced_at)
    .bind(symbol)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
