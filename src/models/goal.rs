use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::AccountType;

/// Savings goal categories. Each maps to an ordered list of account types
/// that should back a goal of that kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalCategory {
    EmergencyFund,
    Retirement,
    Investment,
    Education,
    Home,
    Vacation,
    Vehicle,
    DebtPayoff,
    Other,
}

impl GoalCategory {
    /// Parse the display label stored on a goal. Unrecognised labels are `Other`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "emergency fund" | "emergency" => GoalCategory::EmergencyFund,
            "retirement" => GoalCategory::Retirement,
            "investment" | "investing" => GoalCategory::Investment,
            "education" => GoalCategory::Education,
            "home" | "house" | "home purchase" => GoalCategory::Home,
            "vacation" | "travel" => GoalCategory::Vacation,
            "car" | "vehicle" => GoalCategory::Vehicle,
            "debt payoff" | "debt" => GoalCategory::DebtPayoff,
            _ => GoalCategory::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GoalCategory::EmergencyFund => "Emergency Fund",
            GoalCategory::Retirement => "Retirement",
            GoalCategory::Investment => "Investment",
            GoalCategory::Education => "Education",
            GoalCategory::Home => "Home",
            GoalCategory::Vacation => "Vacation",
            GoalCategory::Vehicle => "Vehicle",
            GoalCategory::DebtPayoff => "Debt Payoff",
            GoalCategory::Other => "Other",
        }
    }

    /// Account types in order of preference. Empty means "no preference".
    pub fn preferred_account_types(&self) -> &'static [AccountType] {
        match self {
            GoalCategory::EmergencyFund => &[AccountType::Savings, AccountType::Checking],
            GoalCategory::Retirement => &[AccountType::Retirement, AccountType::Investment],
            GoalCategory::Investment => &[AccountType::Investment, AccountType::Retirement],
            GoalCategory::Education => &[AccountType::Savings, AccountType::Investment],
            GoalCategory::Home => &[AccountType::Savings, AccountType::Investment],
            GoalCategory::Vacation => &[AccountType::Savings, AccountType::Checking],
            GoalCategory::Vehicle => &[AccountType::Savings, AccountType::Checking],
            GoalCategory::DebtPayoff => &[AccountType::Checking, AccountType::Savings],
            GoalCategory::Other => &[],
        }
    }
}

// Attribution of part of an account balance to a goal. Does not move funds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct GoalAllocation {
    pub goal_id: uuid::Uuid,
    pub account_id: uuid::Uuid,
    pub allocated_amount: BigDecimal,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Goal {
    pub id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub name: String,
    pub category: String,
    pub priority: String,
    pub target_amount: BigDecimal,
    pub current_amount: BigDecimal,
    pub target_date: Option<NaiveDate>,
    pub linked_account_id: Option<uuid::Uuid>,
    pub is_account_backed: bool,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub allocations: Vec<GoalAllocation>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateGoal {
    pub name: String,
    pub category: String,
    pub priority: Option<String>,
    pub target_amount: BigDecimal,
    pub current_amount: Option<BigDecimal>,
    pub target_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateGoalProgress {
    pub current_amount: BigDecimal,
    pub target_amount: Option<BigDecimal>,
}

impl Goal {
    pub fn new(user_id: uuid::Uuid, data: CreateGoal) -> Self {
        let mut goal = Self {
            id: uuid::Uuid::new_v4(),
            user_id,
            name: data.name,
            category: data.category,
            priority: data.priority.unwrap_or_else(|| "medium".to_string()),
            target_amount: data.target_amount,
            current_amount: data.current_amount.unwrap_or_else(BigDecimal::zero),
            target_date: data.target_date,
            linked_account_id: None,
            is_account_backed: false,
            is_completed: false,
            created_at: Utc::now(),
            allocations: Vec::new(),
        };
        goal.refresh_derived();
        goal
    }

    pub fn category_kind(&self) -> GoalCategory {
        GoalCategory::from_label(&self.category)
    }

    /// Re-derive completion and backing flags. Must run before every save.
    pub fn refresh_derived(&mut self) {
        self.is_completed = self.current_amount >= self.target_amount;
        self.is_account_backed = !self.allocations.is_empty();
    }

    pub fn allocated_total(&self) -> BigDecimal {
        self.allocations
            .iter()
            .fold(BigDecimal::zero(), |acc, a| acc + &a.allocated_amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goal(target: i64, current: i64) -> Goal {
        Goal::new(
            uuid::Uuid::new_v4(),
            CreateGoal {
                name: "Rainy day".to_string(),
                category: "Emergency Fund".to_string(),
                priority: None,
                target_amount: BigDecimal::from(target),
                current_amount: Some(BigDecimal::from(current)),
                target_date: None,
            },
        )
    }

    #[test]
    fn test_completion_follows_current_vs_target() {
        assert!(!goal(5000, 4999).is_completed);
        assert!(goal(5000, 5000).is_completed);

        let mut g = goal(5000, 100);
        g.current_amount = BigDecimal::from(6000);
        g.refresh_derived();
        assert!(g.is_completed);
    }

    #[test]
    fn test_account_backed_requires_allocation_records() {
        let mut g = goal(5000, 100);
        g.is_account_backed = true;
        g.refresh_derived();
        assert!(!g.is_account_backed);

        g.allocations.push(GoalAllocation {
            goal_id: g.id,
            account_id: uuid::Uuid::new_v4(),
            allocated_amount: BigDecimal::from(100),
            last_updated: Utc::now(),
        });
        g.refresh_derived();
        assert!(g.is_account_backed);
    }

    #[test]
    fn test_category_labels_map_to_preferences() {
        assert_eq!(GoalCategory::from_label("Emergency Fund"), GoalCategory::EmergencyFund);
        assert_eq!(GoalCategory::from_label(" retirement "), GoalCategory::Retirement);
        assert_eq!(GoalCategory::from_label("Boat"), GoalCategory::Other);
        assert_eq!(
            GoalCategory::Retirement.preferred_account_types(),
            &[AccountType::Retirement, AccountType::Investment]
        );
        assert!(GoalCategory::Other.preferred_account_types().is_empty());
    }
}
