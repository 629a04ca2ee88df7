use async_trait::async_trait;
use bigdecimal::{BigDecimal, FromPrimitive, Zero};
use chrono::NaiveDate;
use thiserror::Error;

/// One validated daily bar from an external feed.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalPricePoint {
    pub date: NaiveDate,
    pub open: BigDecimal,
    pub high: BigDecimal,
    pub low: BigDecimal,
    pub close: BigDecimal,
    pub volume: i64,
}

impl ExternalPricePoint {
    /// Build a point from raw feed values, rejecting anything that is not a positive finite number.
    pub fn from_raw(
        date: NaiveDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: i64,
    ) -> Result<Self, PriceProviderError> {
        Ok(Self {
            date,
            open: positive_decimal("open", date, open)?,
            high: positive_decimal("high", date, high)?,
            low: positive_decimal("low", date, low)?,
            close: positive_decimal("close", date, close)?,
            volume: volume.max(0),
        })
    }
}

fn positive_decimal(field: &str, date: NaiveDate, value: f64) -> Result<BigDecimal, PriceProviderError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(PriceProviderError::InvalidPrice(format!(
            "{} on {} is not a positive finite number: {}",
            field, date, value
        )));
    }
    let decimal = BigDecimal::from_f64(value)
        .ok_or_else(|| PriceProviderError::InvalidPrice(format!("{} on {} cannot be represented", field, date)))?;
    if decimal <= BigDecimal::zero() {
        return Err(PriceProviderError::InvalidPrice(format!("{} on {} rounds to zero", field, date)));
    }
    Ok(decimal)
}

#[derive(Debug, Error)]
pub enum PriceProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid price: {0}")]
    InvalidPrice(String),

    #[error("symbol not found: {0}")]
    NotFound(String),

    #[error("rate limited")]
    RateLimited,
}

#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Daily bars for roughly the last `days` days, ascending by date.
    async fn fetch_daily_history(
        &self,
        symbol: &str,
        days: u32,
    ) -> Result<Vec<ExternalPricePoint>, PriceProviderError>;
}
