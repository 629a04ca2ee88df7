use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{error, info};

use crate::db;
use crate::errors::AppError;
use crate::models::{
    Account, DailyPrice, Debt, Goal, GoalBalanceChange, Investment, NetWorthMilestone, PhysicalAsset, Transaction,
    User,
};
use crate::services::admin_service::BatchReport;

/// Every table, exported as JSON. Goals carry their allocation records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseBackup {
    pub created_at: DateTime<Utc>,
    pub users: Vec<User>,
    pub accounts: Vec<Account>,
    pub transactions: Vec<Transaction>,
    pub investments: Vec<Investment>,
    pub daily_prices: Vec<DailyPrice>,
    pub debts: Vec<Debt>,
    pub physical_assets: Vec<PhysicalAsset>,
    pub goals: Vec<Goal>,
    pub net_worth_milestones: Vec<NetWorthMilestone>,
    pub goal_balance_history: Vec<GoalBalanceChange>,
}

impl DatabaseBackup {
    pub fn record_count(&self) -> usize {
        self.users.len()
            + self.accounts.len()
            + self.transactions.len()
            + self.investments.len()
            + self.daily_prices.len()
            + self.debts.len()
            + self.physical_assets.len()
            + self.goals.len()
            + self.goals.iter().map(|g| g.allocations.len()).sum::<usize>()
            + self.net_worth_milestones.len()
            + self.goal_balance_history.len()
    }
}

pub fn backup_file_name(at: DateTime<Utc>) -> String {
    format!("wealthwise-backup-{}.json", at.format("%Y%m%d-%H%M%S"))
}

pub async fn export(pool: &PgPool) -> Result<DatabaseBackup, AppError> {
    let (users, accounts, transactions, investments, daily_prices, debts) = tokio::try_join!(
        db::user_queries::fetch_all(pool),
        db::account_queries::fetch_all(pool),
        db::transaction_queries::fetch_all(pool),
        db::investment_queries::fetch_all(pool),
        db::price_queries::fetch_all(pool),
        db::debt_queries::fetch_all(pool),
    )?;
    let (physical_assets, goals, net_worth_milestones, goal_balance_history) = tokio::try_join!(
        db::physical_asset_queries::fetch_all(pool),
        db::goal_queries::fetch_all(pool),
        db::milestone_queries::fetch_all(pool),
        db::balance_history_queries::fetch_all(pool),
    )?;

    Ok(DatabaseBackup {
        created_at: Utc::now(),
        users,
        accounts,
        transactions,
        investments,
        daily_prices,
        debts,
        physical_assets,
        goals,
        net_worth_milestones,
        goal_balance_history,
    })
}

/// Write a timestamped JSON backup into `dir` and return its path.
pub async fn backup(pool: &PgPool, dir: &Path) -> Result<PathBuf, AppError> {
    let snapshot = export(pool).await?;

    tokio::fs::create_dir_all(dir).await.map_err(|e| {
        error!("Failed to create backup directory {}: {}", dir.display(), e);
        AppError::Io(e)
    })?;

    let path = dir.join(backup_file_name(snapshot.created_at));
    let body = serde_json::to_vec_pretty(&snapshot)?;
    tokio::fs::write(&path, body).await?;

    info!("Backed up {} records to {}", snapshot.record_count(), path.display());
    Ok(path)
}

pub async fn read_backup(path: &Path) -> Result<DatabaseBackup, AppError> {
    let body = tokio::fs::read(path).await.map_err(|e| {
        error!("Failed to read backup {}: {}", path.display(), e);
        AppError::Io(e)
    })?;
    Ok(serde_json::from_slice(&body)?)
}

fn tally(report: &mut BatchReport, inserted: bool) {
    if inserted {
        report.success();
    } else {
        report.skip();
    }
}

/// Insert every row of a backup in dependency order inside one transaction.
/// Rows whose id already exists are skipped; any database error rolls the whole restore back.
pub async fn restore(pool: &PgPool, backup: &DatabaseBackup) -> Result<BatchReport, AppError> {
    let mut report = BatchReport::default();
    let mut tx = pool.begin().await?;

    for u in &backup.users {
        tally(&mut report, db::user_queries::insert(&mut *tx, u).await?);
    }
    for a in &backup.accounts {
        tally(&mut report, db::account_queries::insert(&mut *tx, a).await?);
    }
    for t in &backup.transactions {
        tally(&mut report, db::transaction_queries::insert(&mut *tx, t).await?);
    }
    for i in &backup.investments {
        tally(&mut report, db::investment_queries::insert(&mut *tx, i).await?);
    }
    // Feed rows go first so a placeholder for the same date is the one skipped.
    let (feed, placeholders): (Vec<&DailyPrice>, Vec<&DailyPrice>) =
        backup.daily_prices.iter().partition(|p| p.is_authoritative());
    for p in feed.into_iter().chain(placeholders) {
        tally(&mut report, db::price_queries::insert(&mut *tx, p).await?);
    }
    for d in &backup.debts {
        tally(&mut report, db::debt_queries::insert(&mut *tx, d).await?);
    }
    for a in &backup.physical_assets {
        tally(&mut report, db::physical_asset_queries::insert(&mut *tx, a).await?);
    }
    for g in &backup.goals {
        tally(&mut report, db::goal_queries::insert(&mut *tx, g).await?);
        for a in &g.allocations {
            tally(&mut report, db::goal_queries::insert_allocation(&mut *tx, a).await?);
        }
    }
    for m in &backup.net_worth_milestones {
        tally(&mut report, db::milestone_queries::insert(&mut *tx, m).await?);
    }
    for h in &backup.goal_balance_history {
        tally(&mut report, db::balance_history_queries::insert(&mut *tx, h).await?);
    }

    tx.commit().await?;
    info!(
        "Restore finished: {} rows processed, {} inserted, {} already present",
        report.processed,
        report.succeeded,
        report.skipped()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use chrono::TimeZone;
    use crate::models::CreateGoal;

    fn empty(at: DateTime<Utc>) -> DatabaseBackup {
        DatabaseBackup {
            created_at: at,
            users: vec![],
            accounts: vec![],
            transactions: vec![],
            investments: vec![],
            daily_prices: vec![],
            debts: vec![],
            physical_assets: vec![],
            goals: vec![],
            net_worth_milestones: vec![],
            goal_balance_history: vec![],
        }
    }

    #[test]
    fn test_file_name_is_timestamped() {
        let at = Utc.with_ymd_and_hms(2026, 10, 16, 9, 5, 3).unwrap();
        assert_eq!(backup_file_name(at), "wealthwise-backup-20261016-090503.json");
    }

    #[test]
    fn test_goal_allocations_survive_json() {
        let user = User::new("a@b.c".to_string(), "A".to_string());
        let mut goal = Goal::new(
            user.id,
            CreateGoal {
                name: "Fund".to_string(),
                category: "Emergency Fund".to_string(),
                priority: None,
                target_amount: BigDecimal::from(1000),
                current_amount: None,
                target_date: None,
            },
        );
        goal.allocations.push(crate::models::GoalAllocation {
            goal_id: goal.id,
            account_id: uuid::Uuid::new_v4(),
            allocated_amount: BigDecimal::from(250),
            last_updated: Utc::now(),
        });
        goal.refresh_derived();

        let mut snapshot = empty(Utc::now());
        snapshot.users.push(user);
        snapshot.goals.push(goal);

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: DatabaseBackup = serde_json::from_str(&json).unwrap();
        assert_eq!(back.goals[0].allocations.len(), 1);
        assert!(back.goals[0].is_account_backed);
        assert_eq!(back.record_count(), 3);
    }
}
