use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Debt {
    pub id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub name: String,
    pub total_amount: BigDecimal,
    pub remaining_balance: BigDecimal,
    pub interest_rate: BigDecimal,
    pub minimum_payment: BigDecimal,
    pub is_paid_off: bool,
    pub paid_off_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateDebt {
    pub name: String,
    pub total_amount: BigDecimal,
    pub remaining_balance: BigDecimal,
    pub interest_rate: Option<BigDecimal>,
    pub minimum_payment: Option<BigDecimal>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateDebt {
    pub remaining_balance: BigDecimal,
    pub interest_rate: Option<BigDecimal>,
    pub minimum_payment: Option<BigDecimal>,
}

impl Debt {
    pub fn new(user_id: uuid::Uuid, data: CreateDebt) -> Self {
        let mut debt = Self {
            id: uuid::Uuid::new_v4(),
            user_id,
            name: data.name,
            total_amount: data.total_amount,
            remaining_balance: data.remaining_balance,
            interest_rate: data.interest_rate.unwrap_or_else(BigDecimal::zero),
            minimum_payment: data.minimum_payment.unwrap_or_else(BigDecimal::zero),
            is_paid_off: false,
            paid_off_at: None,
            is_active: true,
            created_at: Utc::now(),
        };
        debt.normalize(Utc::now());
        debt
    }

    /// Re-derive the paid-off state from the remaining balance. Must run before every save.
    ///
    /// A balance at or below zero marks the debt paid off and clamps the balance to zero.
    /// The original payoff time is kept on repeated saves; reopening a debt clears it.
    pub fn normalize(&mut self, now: DateTime<Utc>) {
        if self.remaining_balance <= BigDecimal::zero() {
            self.remaining_balance = BigDecimal::zero();
            if !self.is_paid_off || self.paid_off_at.is_none() {
                self.paid_off_at = Some(now);
            }
            self.is_paid_off = true;
        } else {
            self.is_paid_off = false;
            self.paid_off_at = None;
        }
    }

    /// Counts toward liabilities only while active and not yet paid off.
    pub fn outstanding(&self) -> Option<&BigDecimal> {
        if self.is_active && !self.is_paid_off {
            Some(&self.remaining_balance)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn debt(remaining: i64) -> Debt {
        Debt::new(
            uuid::Uuid::new_v4(),
            CreateDebt {
                name: "Car loan".to_string(),
                total_amount: BigDecimal::from(10_000),
                remaining_balance: BigDecimal::from(remaining),
                interest_rate: None,
                minimum_payment: None,
            },
        )
    }

    #[test]
    fn test_overpayment_clamps_balance_and_marks_paid_off() {
        let d = debt(-25);
        assert!(d.is_paid_off);
        assert_eq!(d.remaining_balance, BigDecimal::zero());
        assert!(d.paid_off_at.is_some());
        assert!(d.outstanding().is_none());
    }

    #[test]
    fn test_paid_off_at_is_stable_across_saves() {
        let mut d = debt(0);
        let first = d.paid_off_at;
        d.normalize(Utc::now() + Duration::days(3));
        assert_eq!(d.paid_off_at, first);
    }

    #[test]
    fn test_reopened_debt_clears_paid_off_state() {
        let mut d = debt(0);
        d.remaining_balance = BigDecimal::from(400);
        d.normalize(Utc::now());
        assert!(!d.is_paid_off);
        assert!(d.paid_off_at.is_none());
        assert_eq!(d.outstanding(), Some(&BigDecimal::from(400)));
    }
}
