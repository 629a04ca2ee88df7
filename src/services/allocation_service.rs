use std::collections::HashMap;

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db;
use crate::errors::AppError;
use crate::models::{Account, Goal, GoalAllocation, CURRENCY_SCALE};
use crate::services::balance_history_service::BalanceHistoryRecorder;

/// Share of an account balance that may be committed to goals.
pub fn allocation_cap() -> BigDecimal {
    BigDecimal::from(8) / BigDecimal::from(10)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationDecision {
    pub account_id: Uuid,
    pub account_name: String,
    pub account_type: String,
    pub allocated_amount: BigDecimal,
}

/// Sum of allocations per account made by goals other than `goal_id`.
pub fn commitments_excluding(allocations: &[GoalAllocation], goal_id: Uuid) -> HashMap<Uuid, BigDecimal> {
    let mut committed: HashMap<Uuid, BigDecimal> = HashMap::new();
    for a in allocations.iter().filter(|a| a.goal_id != goal_id) {
        *committed.entry(a.account_id).or_insert_with(BigDecimal::zero) += &a.allocated_amount;
    }
    committed
}

fn pick_highest_balance<'a>(accounts: impl Iterator<Item = &'a Account>) -> Option<&'a Account> {
    accounts.fold(None, |best: Option<&Account>, acc| match best {
        Some(b) if b.balance >= acc.balance => Some(b),
        _ => Some(acc),
    })
}

/// What is left of an account's capped balance once other goals are counted.
pub fn headroom(account: &Account, committed: &HashMap<Uuid, BigDecimal>) -> BigDecimal {
    let cap = &account.balance * allocation_cap();
    match committed.get(&account.id) {
        Some(used) => cap - used,
        None => cap,
    }
}

/// Choose the account that should back a goal.
///
/// Accounts with headroom are ranked first: preferred types for the goal's
/// category in list order, highest balance first within a type, then any other
/// account. When nothing has headroom the best preferred account (or the
/// highest positive balance) is still returned so the caller can report it as
/// insufficient.
pub fn choose_account<'a>(
    goal: &Goal,
    candidates: &'a [Account],
    committed: &HashMap<Uuid, BigDecimal>,
) -> Option<&'a Account> {
    let eligible: Vec<&Account> = candidates
        .iter()
        .filter(|a| a.is_active && a.user_id == Some(goal.user_id))
        .collect();
    let preferred = goal.category_kind().preferred_account_types();
    let has_room = |a: &&Account| headroom(a, committed) > BigDecimal::zero();

    for kind in preferred {
        let chosen = pick_highest_balance(
            eligible.iter().copied().filter(has_room).filter(|a| a.kind() == Some(*kind)),
        );
        if chosen.is_some() {
            return chosen;
        }
    }
    if let Some(chosen) = pick_highest_balance(eligible.iter().copied().filter(has_room)) {
        return Some(chosen);
    }

    for kind in preferred {
        let chosen = pick_highest_balance(eligible.iter().copied().filter(|a| a.kind() == Some(*kind)));
        if chosen.is_some() {
            return chosen;
        }
    }
    pick_highest_balance(eligible.into_iter().filter(|a| a.balance > BigDecimal::zero()))
}

/// Decide which account backs `goal` and how much of it.
///
/// `committed` holds what other goals already claim on each account; the amount
/// offered is `min(current, balance * cap - committed)`.
pub fn select_allocation(
    goal: &Goal,
    candidates: &[Account],
    committed: &HashMap<Uuid, BigDecimal>,
) -> Result<AllocationDecision, AppError> {
    let account = choose_account(goal, candidates, committed).ok_or_else(|| {
        AppError::NoSuitableAccount(format!(
            "No active account with a positive balance for goal '{}'",
            goal.name
        ))
    })?;

    let available = headroom(account, committed);
    let amount = if goal.current_amount < available {
        goal.current_amount.clone()
    } else {
        available
    };
    // Truncate so rounding can never push the amount over the cap.
    let amount = amount.with_scale(CURRENCY_SCALE);

    if amount <= BigDecimal::zero() {
        return Err(AppError::InsufficientBalance(format!(
            "Account '{}' has no unallocated balance for goal '{}'",
            account.name, goal.name
        )));
    }

    Ok(AllocationDecision {
        account_id: account.id,
        account_name: account.name.clone(),
        account_type: account.account_type.clone(),
        allocated_amount: amount,
    })
}

/// Record the decision as the goal's only allocation.
///
/// Returns the records it superseded on other accounts.
pub fn apply_allocation(goal: &mut Goal, decision: &AllocationDecision, now: DateTime<Utc>) -> Vec<GoalAllocation> {
    let mut superseded = std::mem::take(&mut goal.allocations);
    superseded.retain(|a| a.account_id != decision.account_id);
    goal.allocations.push(GoalAllocation {
        goal_id: goal.id,
        account_id: decision.account_id,
        allocated_amount: decision.allocated_amount.clone(),
        last_updated: now,
    });
    goal.linked_account_id = Some(decision.account_id);
    goal.refresh_derived();
    superseded
}

/// Shrink allocations so their total never exceeds `current_amount`.
///
/// Records are trimmed in order; any that reach zero are dropped. Returns the
/// released portion per account.
pub fn clamp_to_current(goal: &mut Goal, now: DateTime<Utc>) -> Vec<GoalAllocation> {
    let mut remaining = if goal.current_amount > BigDecimal::zero() {
        goal.current_amount.clone()
    } else {
        BigDecimal::zero()
    };
    let mut released = Vec::new();

    for a in goal.allocations.iter_mut() {
        if a.allocated_amount > remaining {
            released.push(GoalAllocation {
                goal_id: a.goal_id,
                account_id: a.account_id,
                allocated_amount: &a.allocated_amount - &remaining,
                last_updated: now,
            });
            a.allocated_amount = remaining.clone();
            a.last_updated = now;
        }
        remaining = &remaining - &a.allocated_amount;
    }

    goal.allocations.retain(|a| a.allocated_amount > BigDecimal::zero());
    if let Some(linked) = goal.linked_account_id {
        if !goal.allocations.iter().any(|a| a.account_id == linked) {
            goal.linked_account_id = goal.allocations.first().map(|a| a.account_id);
        }
    }
    goal.refresh_derived();
    released
}

/// Clear every allocation on the goal and return what was removed. No funds move.
pub fn rollback(goal: &mut Goal) -> Vec<GoalAllocation> {
    let removed = std::mem::take(&mut goal.allocations);
    goal.linked_account_id = None;
    goal.refresh_derived();
    removed
}

pub async fn record_allocation(
    recorder: &dyn BalanceHistoryRecorder,
    goal: &Goal,
    decision: &AllocationDecision,
) -> Result<(), AppError> {
    recorder
        .record_goal_balance_change(
            goal.id,
            decision.account_id,
            goal.user_id,
            &decision.allocated_amount,
            true,
            &format!("Allocated to goal '{}' from {}", goal.name, decision.account_name),
        )
        .await
}

pub async fn record_rollback(
    recorder: &dyn BalanceHistoryRecorder,
    goal: &Goal,
    removed: &[GoalAllocation],
) -> Result<(), AppError> {
    for a in removed {
        recorder
            .record_goal_balance_change(
                goal.id,
                a.account_id,
                goal.user_id,
                &a.allocated_amount,
                false,
                &format!("Allocation for goal '{}' rolled back", goal.name),
            )
            .await?;
    }
    Ok(())
}

pub async fn record_release(
    recorder: &dyn BalanceHistoryRecorder,
    goal: &Goal,
    released: &[GoalAllocation],
    reason: &str,
) -> Result<(), AppError> {
    for a in released {
        recorder
            .record_goal_balance_change(
                goal.id,
                a.account_id,
                goal.user_id,
                &a.allocated_amount,
                false,
                &format!("Released {} from goal '{}': {}", a.allocated_amount, goal.name, reason),
            )
            .await?;
    }
    Ok(())
}

/// Candidate accounts for a goal's owner plus what other goals already hold on them.
pub async fn load_candidates(
    pool: &PgPool,
    goal: &Goal,
) -> Result<(Vec<Account>, HashMap<Uuid, BigDecimal>), AppError> {
    let accounts = db::account_queries::fetch_active_for_user(pool, goal.user_id).await?;
    let ids: Vec<Uuid> = accounts.iter().map(|a| a.id).collect();
    let existing = db::goal_queries::fetch_allocations_for_accounts(pool, &ids).await?;
    Ok((accounts, commitments_excluding(&existing, goal.id)))
}

pub async fn allocate_goal(
    pool: &PgPool,
    recorder: &dyn BalanceHistoryRecorder,
    goal_id: Uuid,
) -> Result<Goal, AppError> {
    let mut goal = db::goal_queries::fetch_one(pool, goal_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Goal {} not found", goal_id)))?;

    let (accounts, committed) = load_candidates(pool, &goal).await?;
    let decision = select_allocation(&goal, &accounts, &committed)?;

    let superseded = apply_allocation(&mut goal, &decision, Utc::now());
    db::goal_queries::save(pool, &goal).await?;
    record_release(recorder, &goal, &superseded, "re-allocated to another account").await?;
    record_allocation(recorder, &goal, &decision).await?;

    info!(
        "Allocated {} from account {} ({}) to goal {}",
        decision.allocated_amount, decision.account_id, decision.account_type, goal.id
    );
    Ok(goal)
}

pub async fn rollback_goal(
    pool: &PgPool,
    recorder: &dyn BalanceHistoryRecorder,
    goal_id: Uuid,
) -> Result<Goal, AppError> {
    let mut goal = db::goal_queries::fetch_one(pool, goal_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Goal {} not found", goal_id)))?;

    let removed = rollback(&mut goal);
    db::goal_queries::save(pool, &goal).await?;
    record_rollback(recorder, &goal, &removed).await?;

    if removed.is_empty() {
        warn!("Rollback requested for goal {} with no allocations", goal.id);
    } else {
        info!("Rolled back {} allocation(s) for goal {}", removed.len(), goal.id);
    }
    Ok(goal)
}
