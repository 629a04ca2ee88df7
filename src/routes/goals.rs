use axum::extract::{Path, State};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Goal, GoalBalanceChange, UpdateGoalProgress};
use crate::services;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:goal_id/allocate", post(allocate_goal))
        .route("/:goal_id/allocation", delete(rollback_allocation))
        .route("/:goal_id/progress", put(update_progress))
        .route("/:goal_id/history", get(get_balance_history))
}

pub async fn allocate_goal(
    Path(goal_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<Goal>, AppError> {
    info!("POST /goals/{}/allocate - Allocating goal to an account", goal_id);
    let goal = services::allocation_service::allocate_goal(&state.pool, state.balance_history.as_ref(), goal_id)
        .await
        .map_err(|e| {
            match &e {
                AppError::NoSuitableAccount(_) | AppError::InsufficientBalance(_) => {
                    warn!("Goal {} could not be allocated: {}", goal_id, e)
                }
                _ => error!("Failed to allocate goal {}: {}", goal_id, e),
            }
            e
        })?;
    Ok(Json(goal))
}

pub async fn rollback_allocation(
    Path(goal_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<Goal>, AppError> {
    info!("DELETE /goals/{}/allocation - Rolling back allocation", goal_id);
    let goal = services::allocation_service::rollback_goal(&state.pool, state.balance_history.as_ref(), goal_id)
        .await
        .map_err(|e| {
            error!("Failed to roll back goal {}: {}", goal_id, e);
            e
        })?;
    Ok(Json(goal))
}

pub async fn update_progress(
    Path(goal_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(data): Json<UpdateGoalProgress>,
) -> Result<Json<Goal>, AppError> {
    info!("PUT /goals/{}/progress - Updating goal progress", goal_id);
    let goal = services::holdings_service::update_goal_progress(&state.pool, state.balance_history.as_ref(), goal_id, data)
        .await
        .map_err(|e| {
            error!("Failed to update goal {}: {}", goal_id, e);
            e
        })?;
    Ok(Json(goal))
}

pub async fn get_balance_history(
    Path(goal_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<Vec<GoalBalanceChange>>, AppError> {
    info!("GET /goals/{}/history - Fetching balance history", goal_id);
    let history = services::balance_history_service::history_for_goal(&state.pool, goal_id)
        .await
        .map_err(|e| {
            error!("Failed to fetch balance history for goal {}: {}", goal_id, e);
            e
        })?;
    Ok(Json(history))
}
