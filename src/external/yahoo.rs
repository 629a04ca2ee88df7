use crate::external::price_provider::{ExternalPricePoint, PriceProvider, PriceProviderError};
use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;
use tracing::debug;

/// Yahoo Finance chart API. The authoritative price feed; no API key required.
pub struct YahooProvider {
    client: reqwest::Client,
}

impl YahooProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("Mozilla/5.0 (compatible; WealthWise/0.1)")
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new()
    }
}

// Minimal response structs (only what we need)
#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: YahooIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<i64>>,
}

fn range_for_days(days: u32) -> &'static str {
    if days <= 5 { "5d" }
    else if days <= 30 { "1mo" }
    else if days <= 90 { "3mo" }
    else if days <= 180 { "6mo" }
    else { "1y" }
}

/// Turn a chart payload into validated bars. Bars with a missing or invalid value are skipped.
fn parse_chart(symbol: &str, body: YahooChartResponse) -> Result<Vec<ExternalPricePoint>, PriceProviderError> {
    if let Some(err) = body.chart.error {
        let description = err.description.unwrap_or_default();
        if err.code.as_deref() == Some("Not Found") {
            return Err(PriceProviderError::NotFound(symbol.to_string()));
        }
        return Err(PriceProviderError::BadResponse(description));
    }

    let result = body.chart.result
        .and_then(|mut r| r.pop())
        .ok_or_else(|| PriceProviderError::BadResponse("missing result".into()))?;

    let quote = result.indicators.quote
        .first()
        .ok_or_else(|| PriceProviderError::BadResponse("missing quote".into()))?;

    let mut out = Vec::new();

    for (i, ts) in result.timestamp.iter().enumerate() {
        let value = |series: &Vec<Option<f64>>| series.get(i).copied().flatten();
        let (Some(open), Some(high), Some(low), Some(close)) =
            (value(&quote.open), value(&quote.high), value(&quote.low), value(&quote.close))
        else {
            continue;
        };
        let volume = quote.volume.get(i).copied().flatten().unwrap_or(0);

        let date = DateTime::from_timestamp(*ts, 0)
            .ok_or_else(|| PriceProviderError::Parse(format!("bad timestamp {}", ts)))?
            .date_naive();

        match ExternalPricePoint::from_raw(date, open, high, low, close, volume) {
            Ok(point) => out.push(point),
            Err(e) => debug!("Skipping {} bar: {}", symbol, e),
        }
    }

    // Ensure ascending by date
    out.sort_by_key(|p| p.date);
    out.dedup_by_key(|p| p.date);

    Ok(out)
}

#[async_trait]
impl PriceProvider for YahooProvider {
    async fn fetch_daily_history(
        &self,
        symbol: &str,
        days: u32,
    ) -> Result<Vec<ExternalPricePoint>, PriceProviderError> {
        let url = format!(
            "https://query1.finance.yahoo.com/v8/finance/chart/{symbol}?range={}&interval=1d",
            range_for_days(days)
        );

        let resp = self.client
            .get(url)
            .send()
            .await
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        match resp.status() {
            reqwest::StatusCode::TOO_MANY_REQUESTS => return Err(PriceProviderError::RateLimited),
            reqwest::StatusCode::NOT_FOUND => return Err(PriceProviderError::NotFound(symbol.to_string())),
            _ => {}
        }

        let body = resp
            .json::<YahooChartResponse>()
            .await
            .map_err(|e| PriceProviderError::Parse(e.to_string()))?;

        parse_chart(symbol, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Vec<ExternalPricePoint>, PriceProviderError> {
        let body: YahooChartResponse = serde_json::from_str(json).unwrap();
        parse_chart("VTI", body)
    }

    #[test]
    fn test_parses_bars_and_skips_gaps() {
        let points = parse(r#"{"chart":{"result":[{"timestamp":[1767571200,1767657600,1767744000],
            "indicators":{"quote":[{"open":[10.0,null,12.0],"high":[11.0,11.0,13.0],
            "low":[9.0,9.0,11.0],"close":[10.5,10.0,12.5],"volume":[100,200,null]}]}}],"error":null}}"#)
            .unwrap();
        assert_eq!(points.len(), 2);
        assert!(points[0].date < points[1].date);
        assert_eq!(points[1].volume, 0);
    }

    #[test]
    fn test_skips_non_positive_bars() {
        let points = parse(r#"{"chart":{"result":[{"timestamp":[1767571200],
            "indicators":{"quote":[{"open":[0.0],"high":[1.0],"low":[1.0],"close":[1.0],"volume":[1]}]}}],"error":null}}"#)
            .unwrap();
        assert!(points.is_empty());
    }

    #[test]
    fn test_not_found_error_maps_to_not_found() {
        let err = parse(r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#)
            .unwrap_err();
        assert!(matches!(err, PriceProviderError::NotFound(_)));
    }

    #[test]
    fn test_range_mapping() {
        assert_eq!(range_for_days(3), "5d");
        assert_eq!(range_for_days(60), "3mo");
        assert_eq!(range_for_days(400), "1y");
    }
}
