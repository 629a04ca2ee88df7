use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Checking,
    Savings,
    Investment,
    Retirement,
    Credit,
    Loan,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Checking => "checking",
            AccountType::Savings => "savings",
            AccountType::Investment => "investment",
            AccountType::Retirement => "retirement",
            AccountType::Credit => "credit",
            AccountType::Loan => "loan",
        }
    }

    /// Cash-like accounts whose balances count toward liquid assets.
    pub fn is_liquid(&self) -> bool {
        matches!(self, AccountType::Checking | AccountType::Savings)
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "checking" => Ok(AccountType::Checking),
            "savings" => Ok(AccountType::Savings),
            "investment" => Ok(AccountType::Investment),
            "retirement" => Ok(AccountType::Retirement),
            "credit" => Ok(AccountType::Credit),
            "loan" => Ok(AccountType::Loan),
            other => Err(format!("Unknown account type: {}", other)),
        }
    }
}

// A user's bank, brokerage, credit or loan account.
// user_id is optional because imported rows may lack an owner; the validator reports them.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: uuid::Uuid,
    pub user_id: Option<uuid::Uuid>,
    pub name: String,
    pub account_type: String, // Will be converted to/from AccountType
    pub balance: BigDecimal,
    pub currency: String,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAccount {
    pub name: String,
    pub account_type: AccountType,
    pub balance: BigDecimal,
    pub currency: Option<String>,
}

impl Account {
    pub fn new(user_id: uuid::Uuid, data: CreateAccount) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            user_id: Some(user_id),
            name: data.name,
            account_type: data.account_type.as_str().to_string(),
            balance: data.balance,
            currency: data.currency.unwrap_or_else(|| "USD".to_string()),
            is_active: true,
            created_at: chrono::Utc::now(),
        }
    }

    pub fn kind(&self) -> Option<AccountType> {
        self.account_type.parse().ok()
    }

    pub fn is_credit(&self) -> bool {
        self.kind() == Some(AccountType::Credit)
    }

    /// Only credit accounts may legitimately carry a negative balance.
    pub fn has_unexpected_negative_balance(&self) -> bool {
        !self.is_credit() && self.balance < BigDecimal::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(account_type: AccountType, balance: i64) -> Account {
        Account::new(
            uuid::Uuid::new_v4(),
            CreateAccount {
                name: "Test".to_string(),
                account_type,
                balance: BigDecimal::from(balance),
                currency: None,
            },
        )
    }

    #[test]
    fn test_account_type_round_trips_through_storage_string() {
        let acc = account(AccountType::Retirement, 10);
        assert_eq!(acc.account_type, "retirement");
        assert_eq!(acc.kind(), Some(AccountType::Retirement));
        assert_eq!(acc.currency, "USD");
    }

    #[test]
    fn test_unknown_account_type_has_no_kind() {
        let mut acc = account(AccountType::Checking, 10);
        acc.account_type = "crypto".to_string();
        assert_eq!(acc.kind(), None);
    }

    #[test]
    fn test_negative_balance_flagged_only_for_non_credit() {
        assert!(account(AccountType::Checking, -50).has_unexpected_negative_balance());
        assert!(!account(AccountType::Credit, -50).has_unexpected_negative_balance());
        assert!(!account(AccountType::Savings, 0).has_unexpected_negative_balance());
    }
}
