use std::collections::HashMap;

use chrono::NaiveDate;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;
use crate::external::price_provider::ExternalPricePoint;
use crate::models::{DailyPrice, PriceSource};

pub async fn fetch_all(pool: &PgPool) -> Result<Vec<DailyPrice>, sqlx::Error> {
    sqlx::query_as::<_, DailyPrice>(
        "SELECT id, symbol, date, open, high, low, close, volume, source, created_at
         FROM daily_prices
         ORDER BY symbol, date"
    )
    .fetch_all(pool)
    .await
}

/// Price rows for a symbol between two dates inclusive, oldest first.
pub async fn fetch_range(
    pool: &PgPool,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<DailyPrice>, sqlx::Error> {
    sqlx::query_as::<_, DailyPrice>(
        "SELECT id, symbol, date, open, high, low, close, volume, source, created_at
         FROM daily_prices
         WHERE symbol = $1 AND date BETWEEN $2 AND $3
         ORDER BY date ASC, source ASC"
    )
    .bind(symbol)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await
}

pub async fn fetch_latest_by_source(
    pool: &PgPool,
    symbol: &str,
    source: PriceSource,
) -> Result<Option<DailyPrice>, sqlx::Error> {
    sqlx::query_as::<_, DailyPrice>(
        "SELECT id, symbol, date, open, high, low, close, volume, source, created_at
         FROM daily_prices
         WHERE symbol = $1 AND source = $2
         ORDER BY date DESC
         LIMIT 1"
    )
    .bind(symbol)
    .bind(source.as_str())
    .fetch_optional(pool)
    .await
}

/// Latest row per (symbol, source) for many symbols in one query.
///
/// Returns a map of symbol -> latest rows, one per source.
pub async fn fetch_latest_batch(
    pool: &PgPool,
    symbols: &[String],
) -> Result<HashMap<String, Vec<DailyPrice>>, sqlx::Error> {
    if symbols.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = sqlx::query_as::<_, DailyPrice>(
        "SELECT DISTINCT ON (symbol, source)
                id, symbol, date, open, high, low, close, volume, source, created_at
         FROM daily_prices
         WHERE symbol = ANY($1)
         ORDER BY symbol, source, date DESC"
    )
    .bind(symbols)
    .fetch_all(pool)
    .await?;

    let mut result: HashMap<String, Vec<DailyPrice>> = HashMap::new();
    for row in rows {
        result.entry(row.symbol.clone()).or_default().push(row);
    }
    Ok(result)
}

/// Upsert validated points for one symbol and source in a single transaction.
///
/// Feed rows replace placeholders on the same date; placeholder rows never
/// replace feed rows. Skipped points do not count as written.
pub async fn upsert_points(
    pool: &PgPool,
    symbol: &str,
    points: &[ExternalPricePoint],
    source: PriceSource,
) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut written = 0;

    for p in points {
        let result = sqlx::query(
            "INSERT INTO daily_prices (id, symbol, date, open, high, low, close, volume, source)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             ON CONFLICT (symbol, date) DO UPDATE SET
                 open = EXCLUDED.open,
                 high = EXCLUDED.high,
                 low = EXCLUDED.low,
                 close = EXCLUDED.close,
                 volume = EXCLUDED.volume,
                 source = EXCLUDED.source
             WHERE daily_prices.source = $10 OR EXCLUDED.source = $11"
        )
        .bind(Uuid::new_v4())
        .bind(symbol)
        .bind(p.date)
        .bind(&p.open)
        .bind(&p.high)
        .bind(&p.low)
        .bind(&p.close)
        .bind(p.volume)
        .bind(source.as_str())
        .bind(PriceSource::Manual.as_str())
        .bind(PriceSource::YahooFinance.as_str())
        .execute(&mut *tx)
        .await?;
        written += result.rows_affected();
    }

    tx.commit().await?;
    Ok(written)
}

/// Dates in a window that already hold a row from `source`.
pub async fn fetch_dates_by_source(
    pool: &PgPool,
    symbol: &str,
    source: PriceSource,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<NaiveDate>, sqlx::Error> {
    sqlx::query_scalar::<_, NaiveDate>(
        "SELECT date FROM daily_prices
         WHERE symbol = $1 AND source = $2 AND date BETWEEN $3 AND $4"
    )
    .bind(symbol)
    .bind(source.as_str())
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await
}

/// Returns false when the row already exists.
pub async fn insert<'e, E: PgExecutor<'e>>(executor: E, p: &DailyPrice) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO daily_prices (id, symbol, date, open, high, low, close, volume, source, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
         ON CONFLICT DO NOTHING"
    )
    .bind(p.id)
    .bind(&p.symbol)
    .bind(p.date)
    .bind(&p.open)
    .bind(&p.high)
    .bind(&p.low)
    .bind(&p.close)
    .bind(p.volume)
    .bind(&p.source)
    .bind(p.created_at)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}
