use std::fmt;

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Where a price row came from. Only `YahooFinance` rows are authoritative;
/// `Manual` rows are placeholders that yield to real data once it exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    YahooFinance,
    Manual,
}

impl PriceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceSource::YahooFinance => "yahoo_finance",
            PriceSource::Manual => "manual",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "yahoo_finance" => Some(PriceSource::YahooFinance),
            "manual" => Some(PriceSource::Manual),
            _ => None,
        }
    }

    pub fn is_authoritative(&self) -> bool {
        matches!(self, PriceSource::YahooFinance)
    }
}

impl fmt::Display for PriceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Represents one trading day for a symbol. Shared across users.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DailyPrice {
    pub id: Uuid,
    pub symbol: String,
    pub date: NaiveDate,
    pub open: BigDecimal,
    pub high: BigDecimal,
    pub low: BigDecimal,
    pub close: BigDecimal,
    pub volume: i64,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

impl DailyPrice {
    pub fn is_authoritative(&self) -> bool {
        PriceSource::from_tag(&self.source)
            .map(|s| s.is_authoritative())
            .unwrap_or(false)
    }
}

/// Latest-close view returned by the price feed boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatestPrice {
    pub symbol: String,
    pub date: NaiveDate,
    pub close: BigDecimal,
    pub source: String,
}

impl From<DailyPrice> for LatestPrice {
    fn from(p: DailyPrice) -> Self {
        Self {
            symbol: p.symbol,
            date: p.date,
            close: p.close,
            source: p.source,
        }
    }
}
