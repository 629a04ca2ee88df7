use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Currency precision used for every figure in a breakdown.
pub const CURRENCY_SCALE: i64 = 2;

/// The four-way decomposition of a user's net worth.
///
/// Components are rounded to currency precision first and `net_worth` is derived
/// from the rounded values, so the identity holds exactly on every instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetWorthBreakdown {
    pub liquid_assets: BigDecimal,
    pub portfolio_value: BigDecimal,
    pub physical_assets: BigDecimal,
    pub total_liabilities: BigDecimal,
    pub net_worth: BigDecimal,
}

impl NetWorthBreakdown {
    pub fn from_components(
        liquid_assets: BigDecimal,
        portfolio_value: BigDecimal,
        physical_assets: BigDecimal,
        total_liabilities: BigDecimal,
    ) -> Self {
        let liquid_assets = liquid_assets.round(CURRENCY_SCALE);
        let portfolio_value = portfolio_value.round(CURRENCY_SCALE);
        let physical_assets = physical_assets.round(CURRENCY_SCALE);
        let total_liabilities = total_liabilities.round(CURRENCY_SCALE);
        let net_worth = &liquid_assets + &portfolio_value + &physical_assets - &total_liabilities;
        Self {
            liquid_assets,
            portfolio_value,
            physical_assets,
            total_liabilities,
            net_worth,
        }
    }

    pub fn zero() -> Self {
        Self::from_components(
            BigDecimal::zero(),
            BigDecimal::zero(),
            BigDecimal::zero(),
            BigDecimal::zero(),
        )
    }

    pub fn total_assets(&self) -> BigDecimal {
        &self.liquid_assets + &self.portfolio_value + &self.physical_assets
    }
}

/// Event that caused a milestone to be recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneTrigger {
    Transaction,
    InvestmentUpdate,
    ManualUpdate,
    MonthlySnapshot,
    DailySnapshot,
    AccountBalanceChange,
    TrendCalculation,
}

impl MilestoneTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            MilestoneTrigger::Transaction => "transaction",
            MilestoneTrigger::InvestmentUpdate => "investment_update",
            MilestoneTrigger::ManualUpdate => "manual_update",
            MilestoneTrigger::MonthlySnapshot => "monthly_snapshot",
            MilestoneTrigger::DailySnapshot => "daily_snapshot",
            MilestoneTrigger::AccountBalanceChange => "account_balance_change",
            MilestoneTrigger::TrendCalculation => "trend_calculation",
        }
    }
}

impl fmt::Display for MilestoneTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MilestoneTrigger {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transaction" => Ok(MilestoneTrigger::Transaction),
            "investment_update" => Ok(MilestoneTrigger::InvestmentUpdate),
            "manual_update" => Ok(MilestoneTrigger::ManualUpdate),
            "monthly_snapshot" => Ok(MilestoneTrigger::MonthlySnapshot),
            "daily_snapshot" => Ok(MilestoneTrigger::DailySnapshot),
            "account_balance_change" => Ok(MilestoneTrigger::AccountBalanceChange),
            "trend_calculation" => Ok(MilestoneTrigger::TrendCalculation),
            other => Err(format!("Unknown milestone trigger: {}", other)),
        }
    }
}

// Immutable point-in-time net worth record. Never updated once inserted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NetWorthMilestone {
    pub id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub recorded_at: DateTime<Utc>,
    pub trigger: String, // Will be converted to/from MilestoneTrigger
    pub net_worth: BigDecimal,
    pub liquid_assets: BigDecimal,
    pub portfolio_value: BigDecimal,
    pub physical_assets: BigDecimal,
    pub total_liabilities: BigDecimal,
}

impl NetWorthMilestone {
    pub fn new(
        user_id: uuid::Uuid,
        trigger: MilestoneTrigger,
        breakdown: &NetWorthBreakdown,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            user_id,
            recorded_at,
            trigger: trigger.as_str().to_string(),
            net_worth: breakdown.net_worth.clone(),
            liquid_assets: breakdown.liquid_assets.clone(),
            portfolio_value: breakdown.portfolio_value.clone(),
            physical_assets: breakdown.physical_assets.clone(),
            total_liabilities: breakdown.total_liabilities.clone(),
        }
    }

    pub fn breakdown(&self) -> NetWorthBreakdown {
        NetWorthBreakdown {
            liquid_assets: self.liquid_assets.clone(),
            portfolio_value: self.portfolio_value.clone(),
            physical_assets: self.physical_assets.clone(),
            total_liabilities: self.total_liabilities.clone(),
            net_worth: self.net_worth.clone(),
        }
    }
}
