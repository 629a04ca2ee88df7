use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::routes::{admin, goals, health, holdings, prices, users};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::<AppState>::new()
        .nest("/health", health::router())
        .nest("/api/users", users::router())
        .nest("/api/goals", goals::router())
        .nest("/api/debts", holdings::debts_router())
        .nest("/api/assets", holdings::assets_router())
        .nest("/api/prices", prices::router())
        .nest("/api/admin", admin::router())
        .layer(cors)
        .with_state(state)
}
