use std::collections::{BTreeMap, HashSet};

use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use sqlx::PgPool;
use tokio::time::{sleep as async_sleep, Duration};
use tracing::{error, info, warn};

use crate::db;
use crate::errors::AppError;
use crate::external::price_provider::{ExternalPricePoint, PriceProvider, PriceProviderError};
use crate::models::{DailyPrice, LatestPrice, PriceSource};
use crate::services::failure_cache::{FailureCache, FailureType};

const REFRESH_HISTORY_DAYS: u32 = 60;
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Collapse a price range to one row per date, authoritative rows winning over placeholders.
pub fn prefer_authoritative(rows: Vec<DailyPrice>) -> Vec<DailyPrice> {
    let mut by_date: BTreeMap<NaiveDate, DailyPrice> = BTreeMap::new();
    for row in rows {
        match by_date.get(&row.date) {
            Some(existing) if existing.is_authoritative() || !row.is_authoritative() => {}
            _ => {
                by_date.insert(row.date, row);
            }
        }
    }
    by_date.into_values().collect()
}

pub async fn get_price_range(
    pool: &PgPool,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<DailyPrice>, AppError> {
    if start > end {
        return Err(AppError::Validation(format!("start {} is after end {}", start, end)));
    }

    let rows = db::price_queries::fetch_range(pool, symbol, start, end)
        .await
        .map_err(|e| {
            error!("Failed to fetch price range for symbol {}: {}", symbol, e);
            AppError::Db(e)
        })?;
    Ok(prefer_authoritative(rows))
}

/// Latest close for a symbol, from the feed when available, otherwise the newest placeholder.
pub async fn get_latest_price(pool: &PgPool, symbol: &str) -> Result<LatestPrice, AppError> {
    let feed = db::price_queries::fetch_latest_by_source(pool, symbol, PriceSource::YahooFinance).await?;
    let latest = match feed {
        Some(p) => Some(p),
        None => db::price_queries::fetch_latest_by_source(pool, symbol, PriceSource::Manual).await?,
    };

    latest.map(LatestPrice::from).ok_or_else(|| {
        error!("No price data found for symbol {}", symbol);
        AppError::NotFound(format!("No price data found for symbol {}", symbol))
    })
}

fn failure_type_for(e: &PriceProviderError) -> FailureType {
    match e {
        PriceProviderError::RateLimited => FailureType::RateLimited,
        PriceProviderError::NotFound(_) => FailureType::NotFound,
        _ => FailureType::ApiError,
    }
}

/// Pull recent daily bars from the feed and store them as authoritative rows.
///
/// Placeholder rows on the refreshed dates are overwritten and every position in
/// the symbol gets its cached price updated. Returns the number of rows written.
pub async fn refresh_from_api(
    pool: &PgPool,
    provider: &dyn PriceProvider,
    symbol: &str,
    failure_cache: &FailureCache,
) -> Result<u64, AppError> {
    if let Some(failure) = failure_cache.is_failed(symbol) {
        info!(
            "Skipping API call for {} - symbol is in failure cache ({:?}) since {}",
            symbol, failure.error_type, failure.failed_at
        );
        return Err(AppError::External(format!(
            "Symbol {} failed recently ({:?}); retry later",
            symbol, failure.error_type
        )));
    }

    let mut retry_count = 0;

    let points = loop {
        match provider.fetch_daily_history(symbol, REFRESH_HISTORY_DAYS).await {
            Ok(points) => break points,
            Err(PriceProviderError::RateLimited) if retry_count < MAX_RATE_LIMIT_RETRIES => {
                retry_count += 1;
                let delay = Duration::from_secs(5 * retry_count as u64);
                warn!(
                    "Rate limited for symbol {}, retrying in {}s (attempt {}/{})",
                    symbol,
                    delay.as_secs(),
                    retry_count,
                    MAX_RATE_LIMIT_RETRIES
                );
                async_sleep(delay).await;
            }
            Err(e) => {
                failure_cache.record_failure(symbol, failure_type_for(&e));
                error!("Failed to fetch price data for {}: {}", symbol, e);
                return Err(match e {
                    PriceProviderError::RateLimited => AppError::RateLimited,
                    PriceProviderError::NotFound(s) => AppError::NotFound(format!("Unknown symbol {}", s)),
                    other => AppError::External(other.to_string()),
                });
            }
        }
    };

    failure_cache.clear(symbol);

    if points.is_empty() {
        warn!("Feed returned no usable bars for {}", symbol);
        return Ok(0);
    }

    let written = db::price_queries::upsert_points(pool, symbol, &points, PriceSource::YahooFinance)
        .await
        .map_err(|e| {
            error!("Failed to store refreshed prices for symbol {}: {}", symbol, e);
            AppError::Db(e)
        })?;

    if let Some(last) = points.iter().max_by_key(|p| p.date) {
        db::investment_queries::update_cached_price(pool, symbol, &last.close, Utc::now()).await?;
    }

    info!("Refreshed {} price rows for {}", written, symbol);
    Ok(written)
}

/// A random walk of `days` placeholder bars ending today, starting near `start`.
pub fn mock_series(start: f64, days: i64) -> Vec<ExternalPricePoint> {
    let today = Utc::now().date_naive();
    let mut current = start.max(1.0);
    let mut points = Vec::new();

    for i in 0..days {
        current *= 1.0 + (rand::random::<f64>() - 0.5) * 0.02;
        let spread = current * 0.005;
        let volume = rand::random_range(10_000..1_000_000);
        match ExternalPricePoint::from_raw(
            today - ChronoDuration::days(i),
            current,
            current + spread,
            (current - spread).max(0.01),
            current,
            volume,
        ) {
            Ok(p) => points.push(p),
            Err(e) => warn!("Dropping mock bar: {}", e),
        }
    }

    points.reverse();
    points
}

/// Drop points whose date already has feed data.
pub fn without_covered_dates(points: Vec<ExternalPricePoint>, covered: &[NaiveDate]) -> Vec<ExternalPricePoint> {
    let covered: HashSet<NaiveDate> = covered.iter().copied().collect();
    points.into_iter().filter(|p| !covered.contains(&p.date)).collect()
}

/// Write placeholder (`manual`) prices for development data, leaving dates
/// that already have feed data untouched.
pub async fn generate_mock(pool: &PgPool, symbol: &str, days: i64) -> Result<u64, AppError> {
    let points = mock_series(100.0, days);
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return Ok(0);
    };

    let covered =
        db::price_queries::fetch_dates_by_source(pool, symbol, PriceSource::YahooFinance, first.date, last.date)
            .await?;
    let points = without_covered_dates(points, &covered);
    if points.is_empty() {
        info!("Feed data already covers the mock window for {}", symbol);
        return Ok(0);
    }

    db::price_queries::upsert_points(pool, symbol, &points, PriceSource::Manual)
        .await
        .map_err(|e| {
            error!("Failed to generate mock prices for symbol {}: {}", symbol, e);
            AppError::Db(e)
        })
}
