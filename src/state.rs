use std::sync::Arc;
use sqlx::PgPool;
use crate::config::AppConfig;
use crate::external::price_provider::PriceProvider;
use crate::services::balance_history_service::BalanceHistoryRecorder;
use crate::services::failure_cache::FailureCache;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub price_provider: Arc<dyn PriceProvider>,
    pub balance_history: Arc<dyn BalanceHistoryRecorder>,
    pub failure_cache: FailureCache,
}
