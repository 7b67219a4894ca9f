//! The quote provider seam and its decorators.
//!
//! A [`QuoteSource`] answers one question: the daily OHLCV history of one
//! symbol over a half-open date range `[start, end)`. Decorators add caching
//! ([`CachedQuoteSource`]) and retry with backoff ([`RetryingQuoteSource`])
//! without the backtester knowing about either.

use crate::cache::SqliteCache;
use crate::error::{DataError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// A provider of daily quote history.
pub trait QuoteSource: Send + Sync {
    /// Fetch quotes for `symbol` on trading days in `[start, end)`.
    ///
    /// Returns a frame with columns `symbol, date, open, high, low, close,
    /// volume, adjusted_close`. An unknown symbol or an empty window is
    /// reported as [`DataError::MissingData`].
    fn fetch_quotes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Future<Output = Result<DataFrame>> + Send;
}

impl<S: QuoteSource> QuoteSource for &S {
    fn fetch_quotes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Future<Output = Result<DataFrame>> + Send {
        (**self).fetch_quotes(symbol, start, end)
    }
}

/// Check the arguments every source validates the same way.
pub fn validate_request(symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<()> {
    if start >= end {
        return Err(DataError::InvalidDateRange {
            start: start.to_string(),
            end: end.to_string(),
        });
    }

    if symbol.trim().is_empty() {
        return Err(DataError::InvalidSymbol("Empty symbol".to_string()));
    }

    Ok(())
}

/// Configuration for cache usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Whether to use the cache.
    pub use_cache: bool,
    /// Whether to force refresh (ignore cached reads, still write back).
    pub force_refresh: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            use_cache: true,
            force_refresh: false,
        }
    }
}

/// A source that consults a [`SqliteCache`] before its inner source.
///
/// Cache failures never fail a fetch: they are logged and the inner source
/// is used instead.
#[derive(Debug)]
pub struct CachedQuoteSource<S> {
    inner: S,
    cache: Option<Mutex<SqliteCache>>,
    config: FetchConfig,
}

impl<S: QuoteSource> CachedQuoteSource<S> {
    /// Wrap `inner` with `cache`.
    pub fn new(inner: S, cache: SqliteCache, config: FetchConfig) -> Self {
        let cache = config.use_cache.then(|| Mutex::new(cache));
        Self {
            inner,
            cache,
            config,
        }
    }

    /// Wrap `inner` without a cache. Every request goes to the inner source.
    pub const fn uncached(inner: S) -> Self {
        Self {
            inner,
            cache: None,
            config: FetchConfig {
                use_cache: false,
                force_refresh: false,
            },
        }
    }

    /// The wrapped source.
    pub const fn inner(&self) -> &S {
        &self.inner
    }

    fn read_cache(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Option<DataFrame> {
        if self.config.force_refresh {
            return None;
        }
        let cache = self.cache.as_ref()?.lock().ok()?;
        if !cache.covers(symbol, start, end).unwrap_or(false) {
            return None;
        }
        cache.load(symbol, start, end).ok()
    }

    fn write_cache(&self, symbol: &str, start: NaiveDate, end: NaiveDate, df: &DataFrame) {
        let Some(cache) = self.cache.as_ref() else {
            return;
        };
        let result = cache
            .lock()
            .map_err(|e| DataError::Cache(e.to_string()))
            .and_then(|cache| cache.store(symbol, start, end, df));
        if let Err(e) = result {
            warn!(symbol, error = %e, "failed to cache quotes");
        }
    }
}

impl<S: QuoteSource> QuoteSource for CachedQuoteSource<S> {
    async fn fetch_quotes(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<DataFrame> {
        if let Some(df) = self.read_cache(symbol, start, end) {
            debug!(symbol, rows = df.height(), "cache hit");
            return Ok(df);
        }

        let df = self.inner.fetch_quotes(symbol, start, end).await?;
        self.write_cache(symbol, start, end, &df);
        Ok(df)
    }
}

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Zero behaves like one.
    pub max_attempts: u32,
    /// Delay before the first retry; doubled for each further retry.
    #[serde(with = "millis")]
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// A policy that never retries.
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1 << exponent)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub(super) fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// A source that retries transient failures of its inner source.
#[derive(Debug)]
pub struct RetryingQuoteSource<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: QuoteSource> RetryingQuoteSource<S> {
    /// Wrap `inner` with `policy`.
    pub const fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// The retry policy in use.
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

impl<S: QuoteSource> QuoteSource for RetryingQuoteSource<S> {
    async fn fetch_quotes(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<DataFrame> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.inner.fetch_quotes(symbol, start, end).await {
                Ok(df) => return Ok(df),
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = match &e {
                        DataError::RateLimit { retry_after_ms } => {
                            Duration::from_millis(*retry_after_ms).max(self.policy.delay_after(attempt))
                        }
                        _ => self.policy.delay_after(attempt),
                    };
                    warn!(symbol, attempt, error = %e, ?delay, "transient fetch failure, retrying");
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
