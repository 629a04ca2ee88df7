use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::db;
use crate::errors::AppError;
use crate::models::{MilestoneTrigger, NetWorthBreakdown, NetWorthMilestone, CURRENCY_SCALE};

/// Change in net worth across a run of milestones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetWorthTrend {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub start_net_worth: BigDecimal,
    pub end_net_worth: BigDecimal,
    pub change: BigDecimal,
    /// None when the starting net worth is zero.
    pub change_percent: Option<BigDecimal>,
    pub samples: usize,
}

/// Append a milestone. Milestones are never updated or merged.
pub async fn record(
    pool: &PgPool,
    user_id: Uuid,
    trigger: MilestoneTrigger,
    breakdown: &NetWorthBreakdown,
) -> Result<NetWorthMilestone, AppError> {
    let milestone = NetWorthMilestone::new(user_id, trigger, breakdown, Utc::now());
    let written = db::milestone_queries::insert(pool, &milestone).await?;
    let milestone = ensure_appended(written, milestone)?;
    info!(
        "Recorded {} milestone for user {}: {}",
        trigger, user_id, milestone.net_worth
    );
    Ok(milestone)
}

/// A milestone only counts as recorded once its row is in the table.
pub fn ensure_appended(written: bool, milestone: NetWorthMilestone) -> Result<NetWorthMilestone, AppError> {
    if written {
        Ok(milestone)
    } else {
        Err(AppError::Conflict(format!(
            "Milestone {} already exists; nothing was recorded",
            milestone.id
        )))
    }
}

/// Milestones for a user over the last `days` days, oldest first.
pub async fn history(pool: &PgPool, user_id: Uuid, days: i64) -> Result<Vec<NetWorthMilestone>, AppError> {
    if days <= 0 {
        return Err(AppError::Validation("days must be positive".to_string()));
    }
    let since = Utc::now() - Duration::days(days);
    Ok(db::milestone_queries::fetch_for_user_since(pool, user_id, since).await?)
}

pub fn trend(milestones: &[NetWorthMilestone]) -> Option<NetWorthTrend> {
    let first = milestones.iter().min_by_key(|m| m.recorded_at)?;
    let last = milestones.iter().max_by_key(|m| m.recorded_at)?;

    let change = &last.net_worth - &first.net_worth;
    let change_percent = if first.net_worth.is_zero() {
        None
    } else {
        Some((&change * BigDecimal::from(100) / first.net_worth.abs()).round(CURRENCY_SCALE))
    };

    Some(NetWorthTrend {
        from: first.recorded_at,
        to: last.recorded_at,
        start_net_worth: first.net_worth.clone(),
        end_net_worth: last.net_worth.clone(),
        change,
        change_percent,
        samples: milestones.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> BigDecimal {
        s.parse().unwrap()
    }

    fn milestone(net: &str, days_ago: i64) -> NetWorthMilestone {
        let b = NetWorthBreakdown::from_components(dec(net), BigDecimal::zero(), BigDecimal::zero(), BigDecimal::zero());
        NetWorthMilestone::new(
            Uuid::new_v4(),
            MilestoneTrigger::DailySnapshot,
            &b,
            Utc::now() - Duration::days(days_ago),
        )
    }

    #[test]
    fn test_trend_over_unordered_history() {
        let history = vec![milestone("12000", 1), milestone("10000", 10), milestone("11000", 5)];
        let t = trend(&history).unwrap();
        assert_eq!(t.start_net_worth, dec("10000"));
        assert_eq!(t.end_net_worth, dec("12000"));
        assert_eq!(t.change, dec("2000"));
        assert_eq!(t.change_percent, Some(dec("20.00")));
        assert_eq!(t.samples, 3);
    }

    #[test]
    fn test_trend_from_zero_has_no_percent() {
        let t = trend(&[milestone("0", 3), milestone("500", 0)]).unwrap();
        assert_eq!(t.change, dec("500"));
        assert_eq!(t.change_percent, None);
    }

    #[test]
    fn test_unwritten_milestone_is_a_conflict() {
        let m = milestone("100", 0);
        let id = m.id;
        assert_eq!(ensure_appended(true, m.clone()).unwrap().id, id);

        let err = ensure_appended(false, m).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn test_trend_of_empty_history_is_none() {
        assert!(trend(&[]).is_none());
    }
}
