use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tracing::{error, info};

use crate::errors::AppError;
use crate::services;
use crate::services::admin_service::PlanEntry;
use crate::services::validation_service::ValidationReport;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/validate", get(validate))
        .route("/plan", get(plan))
}

pub async fn validate(State(state): State<AppState>) -> Result<Json<ValidationReport>, AppError> {
    info!("GET /admin/validate - Running data integrity checks");
    let report = services::validation_service::run(&state.pool).await.map_err(|e| {
        error!("Failed to run validation: {}", e);
        e
    })?;
    Ok(Json(report))
}

pub async fn plan(State(state): State<AppState>) -> Result<Json<Vec<PlanEntry>>, AppError> {
    info!("GET /admin/plan - Planning goal allocations");
    let entries = services::admin_service::plan(&state.pool).await.map_err(|e| {
        error!("Failed to plan allocations: {}", e);
        e
    })?;
    Ok(Json(entries))
}
