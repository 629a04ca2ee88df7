use bigdecimal::{BigDecimal, Zero};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::db;
use crate::db::stats_queries::TableCounts;
use crate::errors::AppError;
use crate::models::{Goal, NetWorthBreakdown, Transaction, CURRENCY_SCALE};
use crate::services::valuation_service::{self, MissingPricePolicy};

const CASH_FLOW_WINDOW_DAYS: i64 = 30;
const TOP_GOALS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlow {
    pub monthly_income: BigDecimal,
    pub monthly_expenses: BigDecimal,
    pub net: BigDecimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalProgress {
    pub goal_id: Uuid,
    pub name: String,
    pub current_amount: BigDecimal,
    pub target_amount: BigDecimal,
    pub progress_percent: BigDecimal,
    pub is_completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub user_id: Uuid,
    pub breakdown: NetWorthBreakdown,
    pub cash_flow: CashFlow,
    pub total_goals: usize,
    pub completed_goals: usize,
    pub account_backed_goals: usize,
    pub top_goals: Vec<GoalProgress>,
    pub insights: Vec<String>,
}

/// Income is the sum of positive amounts, expenses the sum of negative amounts as a positive figure.
pub fn cash_flow(transactions: &[Transaction]) -> CashFlow {
    let (income, expenses) = transactions.iter().fold(
        (BigDecimal::zero(), BigDecimal::zero()),
        |(inc, exp), t| {
            if t.amount > BigDecimal::zero() {
                (inc + &t.amount, exp)
            } else {
                (inc, exp - &t.amount)
            }
        },
    );
    let monthly_income = income.round(CURRENCY_SCALE);
    let monthly_expenses = expenses.round(CURRENCY_SCALE);
    CashFlow {
        net: &monthly_income - &monthly_expenses,
        monthly_income,
        monthly_expenses,
    }
}

pub fn goal_progress(goal: &Goal) -> GoalProgress {
    let progress_percent = if goal.target_amount > BigDecimal::zero() {
        (&goal.current_amount * BigDecimal::from(100) / &goal.target_amount).round(1)
    } else {
        BigDecimal::zero()
    };
    GoalProgress {
        goal_id: goal.id,
        name: goal.name.clone(),
        current_amount: goal.current_amount.clone(),
        target_amount: goal.target_amount.clone(),
        progress_percent,
        is_completed: goal.is_completed,
    }
}

/// Plain-language observations on net worth, cash flow and the cash/portfolio mix.
pub fn insights(breakdown: &NetWorthBreakdown, flow: &CashFlow) -> Vec<String> {
    let mut out = Vec::new();

    if breakdown.net_worth > BigDecimal::from(100_000) {
        out.push(format!("You have a strong net worth of ${}", breakdown.net_worth));
    } else if breakdown.net_worth > BigDecimal::from(10_000) {
        out.push(format!("You're building wealth with ${} in net worth", breakdown.net_worth));
    } else {
        out.push("Focus on building your emergency fund and initial investments".to_string());
    }

    if flow.monthly_income > flow.monthly_expenses {
        out.push(format!("You have a positive cash flow of ${}/month", flow.net));
    } else if flow.monthly_expenses > flow.monthly_income {
        out.push(format!(
            "You're spending ${} more than you earn monthly",
            &flow.monthly_expenses - &flow.monthly_income
        ));
    }

    let invested_and_cash = &breakdown.portfolio_value + &breakdown.liquid_assets;
    if invested_and_cash > BigDecimal::zero() {
        let share = &breakdown.portfolio_value * BigDecimal::from(100) / &invested_and_cash;
        if share > BigDecimal::from(80) {
            out.push("Your holdings are heavily weighted in investments - keep enough cash on hand".to_string());
        } else if share < BigDecimal::from(30) {
            out.push("Most of your money sits in cash - consider investing for growth".to_string());
        }
    }

    out
}

pub async fn user_summary(pool: &PgPool, user_id: Uuid, stale_after_days: i64) -> Result<UserSummary, AppError> {
    db::user_queries::fetch_one(pool, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

    let since = (Utc::now() - Duration::days(CASH_FLOW_WINDOW_DAYS)).date_naive();
    let (transactions, goals) = tokio::try_join!(
        db::transaction_queries::fetch_for_user_since(pool, user_id, since),
        db::goal_queries::fetch_for_user(pool, user_id),
    )?;

    let breakdown =
        valuation_service::compute_net_worth(pool, user_id, stale_after_days, MissingPricePolicy::SubstituteZero)
            .await?;
    let flow = cash_flow(&transactions);

    let mut top: Vec<&Goal> = goals.iter().filter(|g| !g.is_completed).collect();
    top.sort_by(|a, b| b.current_amount.cmp(&a.current_amount));

    let summary = UserSummary {
        user_id,
        insights: insights(&breakdown, &flow),
        total_goals: goals.len(),
        completed_goals: goals.iter().filter(|g| g.is_completed).count(),
        account_backed_goals: goals.iter().filter(|g| g.is_account_backed).count(),
        top_goals: top.into_iter().take(TOP_GOALS).map(goal_progress).collect(),
        breakdown,
        cash_flow: flow,
    };

    info!(
        "Built summary for user {}: {} transactions in window, {} goals",
        user_id,
        transactions.len(),
        summary.total_goals
    );
    Ok(summary)
}

pub async fn database_summary(pool: &PgPool) -> Result<TableCounts, AppError> {
    Ok(db::stats_queries::table_counts(pool).await?)
}
