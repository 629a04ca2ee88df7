use bigdecimal::{BigDecimal, Zero};
use chrono::Utc;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::db;
use crate::errors::AppError;
use crate::models::{Debt, Goal, GoalAllocation, PhysicalAsset, UpdateDebt, UpdateGoalProgress, UpdatePhysicalAsset};
use crate::services::allocation_service;
use crate::services::balance_history_service::BalanceHistoryRecorder;

/// Apply an edit to a debt and re-derive its paid-off state.
pub fn apply_debt_update(debt: &mut Debt, update: UpdateDebt) {
    debt.remaining_balance = update.remaining_balance;
    if let Some(rate) = update.interest_rate {
        debt.interest_rate = rate;
    }
    if let Some(min) = update.minimum_payment {
        debt.minimum_payment = min;
    }
    debt.normalize(Utc::now());
}

pub fn apply_asset_update(asset: &mut PhysicalAsset, update: UpdatePhysicalAsset) {
    asset.current_value = update.current_value;
    asset.set_loan(update.loan);
}

/// Apply new progress figures. Allocations above the new current amount are
/// trimmed; the released portions are returned.
pub fn apply_goal_progress(goal: &mut Goal, update: UpdateGoalProgress) -> Result<Vec<GoalAllocation>, AppError> {
    if let Some(target) = update.target_amount {
        if target <= BigDecimal::zero() {
            return Err(AppError::Validation("target_amount must be positive".to_string()));
        }
        goal.target_amount = target;
    }
    goal.current_amount = update.current_amount;
    Ok(allocation_service::clamp_to_current(goal, Utc::now()))
}

pub async fn update_debt(pool: &PgPool, id: Uuid, update: UpdateDebt) -> Result<Debt, AppError> {
    let mut debt = db::debt_queries::fetch_one(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Debt {} not found", id)))?;

    apply_debt_update(&mut debt, update);
    let saved = db::debt_queries::save(pool, &debt)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Debt {} not found", id)))?;

    info!("Updated debt {}: remaining {} paid_off={}", id, saved.remaining_balance, saved.is_paid_off);
    Ok(saved)
}

pub async fn update_asset(pool: &PgPool, id: Uuid, update: UpdatePhysicalAsset) -> Result<PhysicalAsset, AppError> {
    let mut asset = db::physical_asset_queries::fetch_one(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Asset {} not found", id)))?;

    apply_asset_update(&mut asset, update);
    let saved = db::physical_asset_queries::save(pool, &asset)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Asset {} not found", id)))?;

    info!("Updated asset {}: equity {}", id, saved.equity);
    Ok(saved)
}

pub async fn update_goal_progress(
    pool: &PgPool,
    recorder: &dyn BalanceHistoryRecorder,
    id: Uuid,
    update: UpdateGoalProgress,
) -> Result<Goal, AppError> {
    let mut goal = db::goal_queries::fetch_one(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Goal {} not found", id)))?;

    let released = apply_goal_progress(&mut goal, update)?;
    db::goal_queries::save(pool, &goal).await?;
    if !released.is_empty() {
        allocation_service::record_release(recorder, &goal, &released, "progress lowered").await?;
        info!("Trimmed {} allocation(s) on goal {} to its new progress", released.len(), id);
    }

    info!("Updated goal {}: {} of {}", id, goal.current_amount, goal.target_amount);
    Ok(goal)
}

pub async fn list_goals(pool: &PgPool, user_id: Uuid) -> Result<Vec<Goal>, AppError> {
    Ok(db::goal_queries::fetch_for_user(pool, user_id).await?)
}
