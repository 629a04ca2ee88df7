use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

use wealthwise_backend::app;
use wealthwise_backend::config::AppConfig;
use wealthwise_backend::external::yahoo::YahooProvider;
use wealthwise_backend::logging::{init_logging, LoggingConfig};
use wealthwise_backend::services::balance_history_service::PgBalanceHistory;
use wealthwise_backend::services::failure_cache::FailureCache;
use wealthwise_backend::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    init_logging(LoggingConfig::from_env())?;

    let config = AppConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    let state = AppState {
        balance_history: Arc::new(PgBalanceHistory::new(pool.clone())),
        pool,
        price_provider: Arc::new(YahooProvider::new()),
        failure_cache: FailureCache::new(),
        config: Arc::new(config.clone()),
    };
    let app = app::create_app(state);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("🚀 Wealthwise backend running at http://{}/", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
