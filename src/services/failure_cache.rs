use std::sync::Arc;
use chrono::{DateTime, Utc, Duration};
use dashmap::DashMap;

/// Information about a failed price feed call for a symbol
#[derive(Debug, Clone)]
pub struct FailureInfo {
    pub failed_at: DateTime<Utc>,
    pub error_type: FailureType,
    pub ttl_hours: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FailureType {
    NotFound,       // Symbol unknown to the feed
    RateLimited,    // Temporary rate limit
    ApiError,       // Other feed errors
}

impl FailureType {
    fn ttl_hours(&self) -> i64 {
        match self {
            FailureType::NotFound => 24,
            FailureType::RateLimited => 1,
            FailureType::ApiError => 6,
        }
    }
}

/// Thread-safe record of symbols whose last refresh failed, so refreshes skip them until the TTL lapses.
#[derive(Clone, Default)]
pub struct FailureCache {
    cache: Arc<DashMap<String, FailureInfo>>,
}

impl FailureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the failure if the symbol is still inside its TTL; expired entries are evicted.
    pub fn is_failed(&self, symbol: &str) -> Option<FailureInfo> {
        if let Some(entry) = self.cache.get(symbol) {
            let info = entry.value().clone();
            let expiry = info.failed_at + Duration::hours(info.ttl_hours);

            if Utc::now() < expiry {
                return Some(info);
            }
            drop(entry); // Release the read lock
            self.cache.remove(symbol);
        }
        None
    }

    pub fn record_failure(&self, symbol: &str, error_type: FailureType) {
        let info = FailureInfo {
            failed_at: Utc::now(),
            ttl_hours: error_type.ttl_hours(),
            error_type,
        };
        self.cache.insert(symbol.to_string(), info);
    }

    pub fn clear(&self, symbol: &str) {
        self.cache.remove(symbol);
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
