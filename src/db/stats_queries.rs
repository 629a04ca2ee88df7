use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TableCounts {
    pub users: i64,
    pub accounts: i64,
    pub transactions: i64,
    pub investments: i64,
    pub daily_prices: i64,
    pub debts: i64,
    pub physical_assets: i64,
    pub goals: i64,
    pub goal_allocations: i64,
    pub net_worth_milestones: i64,
    pub goal_balance_history: i64,
}

pub async fn table_counts(pool: &PgPool) -> Result<TableCounts, sqlx::Error> {
    sqlx::query_as::<_, TableCounts>(
        "SELECT
            (SELECT COUNT(*) FROM users) AS users,
            (SELECT COUNT(*) FROM accounts) AS accounts,
            (SELECT COUNT(*) FROM transactions) AS transactions,
            (SELECT COUNT(*) FROM investments) AS investments,
            (SELECT COUNT(*) FROM daily_prices) AS daily_prices,
            (SELECT COUNT(*) FROM debts) AS debts,
            (SELECT COUNT(*) FROM physical_assets) AS physical_assets,
            (SELECT COUNT(*) FROM goals) AS goals,
            (SELECT COUNT(*) FROM goal_allocations) AS goal_allocations,
            (SELECT COUNT(*) FROM net_worth_milestones) AS net_worth_milestones,
            (SELECT COUNT(*) FROM goal_balance_history) AS goal_balance_history"
    )
    .fetch_one(pool)
    .await
}
