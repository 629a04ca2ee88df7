use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tracing::{info, warn};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(liveness))
        .route("/ready", get(readiness))
}

#[derive(Debug, Serialize)]
pub struct Readiness {
    pub database: bool,
    pub stale_price_days: i64,
}

async fn liveness() -> &'static str {
    info!("GET /health - Liveness check");
    "OK"
}

/// Reports whether the ledger database answers. Returns 503 when it does not.
async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<Readiness>) {
    let database = match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => true,
        Err(e) => {
            warn!("Readiness check could not reach the database: {}", e);
            false
        }
    };

    let status = if database { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    let body = Readiness {
        database,
        stale_price_days: state.config.price_stale_after_days,
    };
    (status, Json(body))
}
