use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// A position in a traded symbol. last_known_price is the cached quote used when the feed is stale.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Investment {
    pub id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub symbol: String,
    pub shares: BigDecimal,
    pub last_known_price: Option<BigDecimal>,
    pub last_price_at: Option<chrono::DateTime<chrono::Utc>>,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateInvestment {
    pub symbol: String,
    pub shares: BigDecimal,
    pub last_known_price: Option<BigDecimal>,
}

impl Investment {
    pub fn new(user_id: uuid::Uuid, data: CreateInvestment) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: uuid::Uuid::new_v4(),
            user_id,
            symbol: data.symbol.trim().to_uppercase(),
            last_price_at: data.last_known_price.as_ref().map(|_| now),
            shares: data.shares,
            last_known_price: data.last_known_price,
            is_active: true,
            created_at: now,
        }
    }
}
