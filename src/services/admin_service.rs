use std::collections::HashMap;

use bigdecimal::{BigDecimal, FromPrimitive, Zero};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db;
use crate::errors::AppError;
use crate::models::{
    Account, AccountType, CreateAccount, CreateDebt, CreateGoal, CreateInvestment, CreatePhysicalAsset,
    CreateTransaction, Debt, Goal, Investment, LoanInfo, PhysicalAsset, Transaction, User,
};
use crate::services::allocation_service;
use crate::services::balance_history_service::BalanceHistoryRecorder;
use crate::services::price_service;

/// Outcome of a batch over many records. Per-item failures are collected, not raised.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

impl BatchReport {
    pub fn success(&mut self) {
        self.processed += 1;
        self.succeeded += 1;
    }

    pub fn skip(&mut self) {
        self.processed += 1;
    }

    pub fn failure(&mut self, message: String) {
        warn!("{}", message);
        self.processed += 1;
        self.failed += 1;
        self.errors.push(message);
    }

    pub fn skipped(&self) -> usize {
        self.processed - self.succeeded - self.failed
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanEntry {
    pub goal_id: Uuid,
    pub goal_name: String,
    pub account_id: Option<Uuid>,
    pub account_name: Option<String>,
    pub allocated_amount: Option<BigDecimal>,
    pub error: Option<String>,
}

/// What `migrate` would do for every unbacked goal, without writing anything.
///
/// Amounts planned for earlier goals count against the same account for later ones.
pub async fn plan(pool: &PgPool) -> Result<Vec<PlanEntry>, AppError> {
    let goals = db::goal_queries::fetch_all(pool).await?;
    let mut planned: HashMap<Uuid, BigDecimal> = HashMap::new();
    let mut entries = Vec::new();

    for goal in goals.iter().filter(|g| !g.is_account_backed) {
        let (accounts, mut committed) = allocation_service::load_candidates(pool, goal).await?;
        for (account_id, amount) in &planned {
            *committed.entry(*account_id).or_insert_with(BigDecimal::zero) += amount;
        }

        let entry = match allocation_service::select_allocation(goal, &accounts, &committed) {
            Ok(d) => {
                *planned.entry(d.account_id).or_insert_with(BigDecimal::zero) += &d.allocated_amount;
                PlanEntry {
                    goal_id: goal.id,
                    goal_name: goal.name.clone(),
                    account_id: Some(d.account_id),
                    account_name: Some(d.account_name),
                    allocated_amount: Some(d.allocated_amount),
                    error: None,
                }
            }
            Err(e) => PlanEntry {
                goal_id: goal.id,
                goal_name: goal.name.clone(),
                account_id: None,
                account_name: None,
                allocated_amount: None,
                error: Some(e.to_string()),
            },
        };
        entries.push(entry);
    }

    info!("Planned allocations for {} unbacked goals", entries.len());
    Ok(entries)
}

/// Allocate every goal that is not yet account-backed.
pub async fn migrate(pool: &PgPool, recorder: &dyn BalanceHistoryRecorder) -> Result<BatchReport, AppError> {
    let goals = db::goal_queries::fetch_all(pool).await?;
    let mut report = BatchReport::default();

    for goal in goals.iter().filter(|g| !g.is_account_backed) {
        match allocation_service::allocate_goal(pool, recorder, goal.id).await {
            Ok(_) => report.success(),
            Err(e) => report.failure(format!("Goal {} ({}): {}", goal.name, goal.id, e)),
        }
    }

    info!(
        "Migration finished: {} processed, {} allocated, {} failed",
        report.processed, report.succeeded, report.failed
    );
    Ok(report)
}

/// Remove allocations from every goal that has any.
pub async fn rollback_all(pool: &PgPool, recorder: &dyn BalanceHistoryRecorder) -> Result<BatchReport, AppError> {
    let goals = db::goal_queries::fetch_all(pool).await?;
    let mut report = BatchReport::default();

    for goal in goals.iter().filter(|g| g.is_account_backed || !g.allocations.is_empty()) {
        match allocation_service::rollback_goal(pool, recorder, goal.id).await {
            Ok(_) => report.success(),
            Err(e) => report.failure(format!("Goal {} ({}): {}", goal.name, goal.id, e)),
        }
    }

    info!(
        "Rollback finished: {} processed, {} rolled back, {} failed",
        report.processed, report.succeeded, report.failed
    );
    Ok(report)
}

fn money(low: f64, high: f64) -> BigDecimal {
    let value = low + rand::random::<f64>() * (high - low);
    BigDecimal::from_f64(value)
        .map(|d| d.round(2))
        .unwrap_or_else(|| BigDecimal::from(low as i64))
}

/// Create a demo user with a spread of accounts, a goal, a debt, an asset and a position.
pub async fn seed(pool: &PgPool) -> Result<Uuid, AppError> {
    let suffix: u32 = rand::random_range(1000..10_000);
    let user = User::new(format!("demo{}@wealthwise.local", suffix), format!("Demo User {}", suffix));
    db::user_queries::insert(pool, &user).await?;

    let specs = [
        ("Everyday Checking", AccountType::Checking, money(800.0, 4000.0)),
        ("High Yield Savings", AccountType::Savings, money(5000.0, 25000.0)),
        ("Brokerage", AccountType::Investment, money(1000.0, 10000.0)),
        ("401k", AccountType::Retirement, money(10000.0, 80000.0)),
        ("Rewards Card", AccountType::Credit, -money(100.0, 2000.0)),
    ];

    let mut accounts: Vec<Account> = Vec::new();
    for (name, account_type, balance) in specs {
        let account = Account::new(
            user.id,
            CreateAccount {
                name: name.to_string(),
                account_type,
                balance,
                currency: None,
            },
        );
        db::account_queries::insert(pool, &account).await?;
        accounts.push(account);
    }

    let today = Utc::now().date_naive();
    let checking = accounts[0].id;
    for i in 0..10 {
        let (amount, category) = if i % 5 == 0 {
            (money(2500.0, 4000.0), "Salary")
        } else {
            (-money(10.0, 250.0), "Groceries")
        };
        let t = Transaction::new(
            user.id,
            CreateTransaction {
                account_id: checking,
                amount,
                category: Some(category.to_string()),
                description: None,
                transaction_date: today - Duration::days(i * 3),
            },
        );
        db::transaction_queries::insert(pool, &t).await?;
    }

    let goal = Goal::new(
        user.id,
        CreateGoal {
            name: "Rainy Day Fund".to_string(),
            category: "Emergency Fund".to_string(),
            priority: Some("high".to_string()),
            target_amount: BigDecimal::from(15_000),
            current_amount: Some(money(1000.0, 6000.0)),
            target_date: Some(today + Duration::days(365)),
        },
    );
    db::goal_queries::insert(pool, &goal).await?;

    let debt = Debt::new(
        user.id,
        CreateDebt {
            name: "Student Loan".to_string(),
            total_amount: BigDecimal::from(30_000),
            remaining_balance: money(5000.0, 25000.0),
            interest_rate: BigDecimal::from_f64(4.5),
            minimum_payment: Some(BigDecimal::from(250)),
        },
    );
    db::debt_queries::insert(pool, &debt).await?;

    let car = PhysicalAsset::new(
        user.id,
        CreatePhysicalAsset {
            name: "Car".to_string(),
            current_value: money(12000.0, 30000.0),
            loan: Some(LoanInfo {
                balance: money(2000.0, 10000.0),
                lender: Some("Credit Union".to_string()),
                rate: BigDecimal::from_f64(6.9),
            }),
        },
    );
    db::physical_asset_queries::insert(pool, &car).await?;

    let position = Investment::new(
        user.id,
        CreateInvestment {
            symbol: "VTI".to_string(),
            shares: money(5.0, 50.0),
            last_known_price: None,
        },
    );
    db::investment_queries::insert(pool, &position).await?;
    let bars = price_service::generate_mock(pool, &position.symbol, 30).await?;

    info!(
        "Seeded demo user {} with {} accounts and {} placeholder price bars",
        user.id,
        accounts.len(),
        bars
    );
    Ok(user.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_report_counts() {
        let mut report = BatchReport::default();
        report.success();
        report.skip();
        report.failure("Goal x: boom".to_string());

        assert_eq!(report.processed, 3);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.errors, vec!["Goal x: boom".to_string()]);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_money_stays_in_range() {
        for _ in 0..50 {
            let m = money(10.0, 20.0);
            assert!(m >= BigDecimal::from(10) && m <= BigDecimal::from(20));
        }
    }
}
