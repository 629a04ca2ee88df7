use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// A house, car or other owned item, optionally financed.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PhysicalAsset {
    pub id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub name: String,
    pub current_value: BigDecimal,
    pub loan_balance: Option<BigDecimal>,
    pub lender: Option<String>,
    pub loan_rate: Option<BigDecimal>,
    pub equity: BigDecimal,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoanInfo {
    pub balance: BigDecimal,
    pub lender: Option<String>,
    pub rate: Option<BigDecimal>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatePhysicalAsset {
    pub name: String,
    pub current_value: BigDecimal,
    pub loan: Option<LoanInfo>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdatePhysicalAsset {
    pub current_value: BigDecimal,
    pub loan: Option<LoanInfo>,
}

impl PhysicalAsset {
    pub fn new(user_id: uuid::Uuid, data: CreatePhysicalAsset) -> Self {
        let mut asset = Self {
            id: uuid::Uuid::new_v4(),
            user_id,
            name: data.name,
            current_value: data.current_value,
            loan_balance: None,
            lender: None,
            loan_rate: None,
            equity: BigDecimal::zero(),
            is_active: true,
            created_at: chrono::Utc::now(),
        };
        asset.set_loan(data.loan);
        asset
    }

    pub fn set_loan(&mut self, loan: Option<LoanInfo>) {
        match loan {
            Some(l) => {
                self.loan_balance = Some(l.balance);
                self.lender = l.lender;
                self.loan_rate = l.rate;
            }
            None => {
                self.loan_balance = None;
                self.lender = None;
                self.loan_rate = None;
            }
        }
        self.recompute_equity();
    }

    /// equity = current value - loan balance. Call after every mutation.
    pub fn recompute_equity(&mut self) {
        self.equity = match &self.loan_balance {
            Some(loan) => &self.current_value - loan,
            None => self.current_value.clone(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equity_without_loan_is_current_value() {
        let asset = PhysicalAsset::new(
            uuid::Uuid::new_v4(),
            CreatePhysicalAsset {
                name: "Bike".to_string(),
                current_value: BigDecimal::from(1200),
                loan: None,
            },
        );
        assert_eq!(asset.equity, BigDecimal::from(1200));
    }

    #[test]
    fn test_equity_tracks_value_and_loan_changes() {
        let mut asset = PhysicalAsset::new(
            uuid::Uuid::new_v4(),
            CreatePhysicalAsset {
                name: "House".to_string(),
                current_value: BigDecimal::from(300_000),
                loan: Some(LoanInfo {
                    balance: BigDecimal::from(220_000),
                    lender: Some("First Bank".to_string()),
                    rate: None,
                }),
            },
        );
        assert_eq!(asset.equity, BigDecimal::from(80_000));

        asset.current_value = BigDecimal::from(310_000);
        asset.recompute_equity();
        asset.recompute_equity();
        assert_eq!(asset.equity, BigDecimal::from(90_000));

        asset.set_loan(None);
        assert_eq!(asset.equity, BigDecimal::from(310_000));
        assert!(asset.lender.is_none());
    }
}
