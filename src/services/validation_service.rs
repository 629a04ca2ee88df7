use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, warn};

use crate::db;
use crate::errors::AppError;
use crate::models::{Account, Goal, Transaction};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub issues: Vec<String>,
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{} {}", n, word)
    } else {
        format!("{} {}s", n, word)
    }
}

/// Run every consistency check over the given records. Never mutates anything.
pub fn validate(transactions: &[Transaction], accounts: &[Account], goals: &[Goal]) -> ValidationReport {
    let mut issues = Vec::new();

    let unowned_transactions = transactions.iter().filter(|t| t.user_id.is_none()).count();
    if unowned_transactions > 0 {
        issues.push(format!("{} without a user reference", plural(unowned_transactions, "transaction")));
    }

    let unowned_accounts = accounts.iter().filter(|a| a.user_id.is_none()).count();
    if unowned_accounts > 0 {
        issues.push(format!("{} without a user reference", plural(unowned_accounts, "account")));
    }

    let negative: Vec<String> = accounts
        .iter()
        .filter(|a| a.has_unexpected_negative_balance())
        .map(|a| format!("{} ({}, {}) balance {}", a.name, a.id, a.account_type, a.balance))
        .collect();
    if !negative.is_empty() {
        issues.push(format!(
            "{} with a negative balance: {}",
            plural(negative.len(), "non-credit account"),
            negative.join("; ")
        ));
    }

    let detached_transactions = transactions.iter().filter(|t| t.account_id.is_none()).count();
    if detached_transactions > 0 {
        issues.push(format!(
            "{} without an account reference",
            plural(detached_transactions, "transaction")
        ));
    }

    let hollow_goals = goals
        .iter()
        .filter(|g| g.is_account_backed && g.allocations.is_empty())
        .count();
    if hollow_goals > 0 {
        issues.push(format!(
            "{} marked account-backed with no allocation records",
            plural(hollow_goals, "goal")
        ));
    }

    let unbacked_goals = goals.iter().filter(|g| !g.is_account_backed).count();
    if unbacked_goals > 0 {
        issues.push(format!("{} not backed by any account", plural(unbacked_goals, "goal")));
    }

    ValidationReport {
        is_valid: issues.is_empty(),
        issues,
    }
}

pub async fn run(pool: &PgPool) -> Result<ValidationReport, AppError> {
    let (transactions, accounts, goals) = tokio::try_join!(
        db::transaction_queries::fetch_all(pool),
        db::account_queries::fetch_all(pool),
        db::goal_queries::fetch_all(pool),
    )?;

    let report = validate(&transactions, &accounts, &goals);
    if report.is_valid {
        info!(
            "Validation passed: {} transactions, {} accounts, {} goals",
            transactions.len(),
            accounts.len(),
            goals.len()
        );
    } else {
        for issue in &report.issues {
            warn!("Validation issue: {}", issue);
        }
    }
    Ok(report)
}
