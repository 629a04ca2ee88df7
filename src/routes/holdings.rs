use axum::extract::{Path, State};
use axum::routing::put;
use axum::{Json, Router};
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Debt, PhysicalAsset, UpdateDebt, UpdatePhysicalAsset};
use crate::services;
use crate::state::AppState;

pub fn debts_router() -> Router<AppState> {
    Router::new().route("/:id", put(update_debt))
}

pub fn assets_router() -> Router<AppState> {
    Router::new().route("/:id", put(update_asset))
}

pub async fn update_debt(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(data): Json<UpdateDebt>,
) -> Result<Json<Debt>, AppError> {
    info!("PUT /debts/{} - Updating debt", id);
    let debt = services::holdings_service::update_debt(&state.pool, id, data)
        .await
        .map_err(|e| {
            error!("Failed to update debt {}: {}", id, e);
            e
        })?;
    Ok(Json(debt))
}

pub async fn update_asset(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(data): Json<UpdatePhysicalAsset>,
) -> Result<Json<PhysicalAsset>, AppError> {
    info!("PUT /assets/{} - Updating physical asset", id);
    let asset = services::holdings_service::update_asset(&state.pool, id, data)
        .await
        .map_err(|e| {
            error!("Failed to update asset {}: {}", id, e);
            e
        })?;
    Ok(Json(asset))
}
