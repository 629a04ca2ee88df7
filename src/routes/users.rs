use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Goal, MilestoneTrigger, NetWorthBreakdown, NetWorthMilestone};
use crate::services;
use crate::services::snapshot_service::NetWorthTrend;
use crate::services::summary_service::UserSummary;
use crate::services::valuation_service::MissingPricePolicy;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:user_id/net-worth", get(get_net_worth).post(record_net_worth))
        .route("/:user_id/milestones", get(get_milestones))
        .route("/:user_id/trend", get(get_trend))
        .route("/:user_id/summary", get(get_summary))
        .route("/:user_id/goals", get(get_goals))
}

#[derive(Debug, Default, Deserialize)]
pub struct NetWorthQuery {
    pub missing_prices: Option<MissingPricePolicy>,
    pub trigger: Option<MilestoneTrigger>,
}

#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    pub days: Option<i64>,
    pub record: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct TrendResponse {
    pub trend: Option<NetWorthTrend>,
    pub recorded: Option<NetWorthMilestone>,
}

pub async fn get_net_worth(
    Path(user_id): Path<Uuid>,
    Query(query): Query<NetWorthQuery>,
    State(state): State<AppState>,
) -> Result<Json<NetWorthBreakdown>, AppError> {
    info!("GET /users/{}/net-worth - Computing net worth", user_id);
    let breakdown = services::valuation_service::compute_net_worth(
        &state.pool,
        user_id,
        state.config.price_stale_after_days,
        query.missing_prices.unwrap_or_default(),
    )
    .await
    .map_err(|e| {
        error!("Failed to compute net worth for user {}: {}", user_id, e);
        e
    })?;
    Ok(Json(breakdown))
}

pub async fn record_net_worth(
    Path(user_id): Path<Uuid>,
    Query(query): Query<NetWorthQuery>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<NetWorthMilestone>), AppError> {
    let trigger = query.trigger.unwrap_or(MilestoneTrigger::ManualUpdate);
    info!("POST /users/{}/net-worth - Recording {} milestone", user_id, trigger);

    let breakdown = services::valuation_service::compute_net_worth(
        &state.pool,
        user_id,
        state.config.price_stale_after_days,
        query.missing_prices.unwrap_or_default(),
    )
    .await?;
    let milestone = services::snapshot_service::record(&state.pool, user_id, trigger, &breakdown)
        .await
        .map_err(|e| {
            error!("Failed to record milestone for user {}: {}", user_id, e);
            e
        })?;
    Ok((StatusCode::CREATED, Json(milestone)))
}

pub async fn get_milestones(
    Path(user_id): Path<Uuid>,
    Query(query): Query<WindowQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<NetWorthMilestone>>, AppError> {
    let days = query.days.unwrap_or(365);
    info!("GET /users/{}/milestones - Last {} days", user_id, days);
    let milestones = services::snapshot_service::history(&state.pool, user_id, days)
        .await
        .map_err(|e| {
            error!("Failed to fetch milestones for user {}: {}", user_id, e);
            e
        })?;
    Ok(Json(milestones))
}

pub async fn get_trend(
    Path(user_id): Path<Uuid>,
    Query(query): Query<WindowQuery>,
    State(state): State<AppState>,
) -> Result<Json<TrendResponse>, AppError> {
    let days = query.days.unwrap_or(30);
    info!("GET /users/{}/trend - Net worth trend over {} days", user_id, days);

    let recorded = if query.record.unwrap_or(false) {
        let breakdown = services::valuation_service::compute_net_worth(
            &state.pool,
            user_id,
            state.config.price_stale_after_days,
            MissingPricePolicy::SubstituteZero,
        )
        .await?;
        Some(
            services::snapshot_service::record(&state.pool, user_id, MilestoneTrigger::TrendCalculation, &breakdown)
                .await?,
        )
    } else {
        None
    };

    let history = services::snapshot_service::history(&state.pool, user_id, days)
        .await
        .map_err(|e| {
            error!("Failed to fetch trend for user {}: {}", user_id, e);
            e
        })?;
    Ok(Json(TrendResponse {
        trend: services::snapshot_service::trend(&history),
        recorded,
    }))
}

pub async fn get_summary(
    Path(user_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<UserSummary>, AppError> {
    info!("GET /users/{}/summary - Building financial summary", user_id);
    let summary = services::summary_service::user_summary(&state.pool, user_id, state.config.price_stale_after_days)
        .await
        .map_err(|e| {
            error!("Failed to build summary for user {}: {}", user_id, e);
            e
        })?;
    Ok(Json(summary))
}

pub async fn get_goals(
    Path(user_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Goal>>, AppError> {
    info!("GET /users/{}/goals - Listing goals", user_id);
    let goals = services::holdings_service::list_goals(&state.pool, user_id)
        .await
        .map_err(|e| {
            error!("Failed to list goals for user {}: {}", user_id, e);
            e
        })?;
    Ok(Json(goals))
}
