pub mod account_queries;
pub mod balance_history_queries;
pub mod debt_queries;
pub mod goal_queries;
pub mod investment_queries;
pub mod milestone_queries;
pub mod physical_asset_queries;
pub mod price_queries;
pub mod stats_queries;
pub mod transaction_queries;
pub mod user_queries;
