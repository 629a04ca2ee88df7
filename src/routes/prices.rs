use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::models::{DailyPrice, LatestPrice};
use crate::services;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:symbol", get(get_prices))
        .route("/:symbol/latest", get(get_latest_price))
        .route("/:symbol/refresh", post(refresh_prices))
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub symbol: String,
    pub rows_written: u64,
}

pub async fn get_prices(
    Path(symbol): Path<String>,
    Query(range): Query<RangeQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<DailyPrice>>, AppError> {
    let symbol = symbol.to_uppercase();
    let end = range.end.unwrap_or_else(|| Utc::now().date_naive());
    let start = range.start.unwrap_or(end - Duration::days(90));
    info!("GET /prices/{} - Price range {} to {}", symbol, start, end);

    let prices = services::price_service::get_price_range(&state.pool, &symbol, start, end)
        .await
        .map_err(|e| {
            error!("Failed to get price range for {}: {}", symbol, e);
            e
        })?;
    Ok(Json(prices))
}

pub async fn get_latest_price(
    Path(symbol): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<LatestPrice>, AppError> {
    let symbol = symbol.to_uppercase();
    info!("GET /prices/{}/latest - Getting latest price", symbol);
    let price = services::price_service::get_latest_price(&state.pool, &symbol)
        .await
        .map_err(|e| {
            error!("Failed to get latest price for {}: {}", symbol, e);
            e
        })?;
    Ok(Json(price))
}

pub async fn refresh_prices(
    Path(symbol): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<RefreshResponse>, AppError> {
    let symbol = symbol.to_uppercase();
    info!("POST /prices/{}/refresh - Refreshing prices from feed", symbol);
    let rows_written = services::price_service::refresh_from_api(
        &state.pool,
        state.price_provider.as_ref(),
        &symbol,
        &state.failure_cache,
    )
    .await
    .map_err(|e| {
        match &e {
            AppError::RateLimited => warn!("Rate limited when refreshing prices for {}", symbol),
            _ => error!("Failed to refresh prices for {}: {}", symbol, e),
        }
        e
    })?;
    Ok(Json(RefreshResponse { symbol, rows_written }))
}
