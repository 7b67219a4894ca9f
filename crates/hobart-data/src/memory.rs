//! An in-memory quote source.
//!
//! Serves fixed price paths. Useful for offline runs, demos and tests, and
//! able to simulate provider failures.

use crate::error::{DataError, Result};
use crate::series::quotes_frame;
use crate::source::{QuoteSource, validate_request};
use chrono::NaiveDate;
use polars::prelude::DataFrame;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Quote source backed by fixed `(date, price)` paths.
#[derive(Debug, Default)]
pub struct InMemoryQuoteSource {
    paths: HashMap<String, Vec<(NaiveDate, f64)>>,
    broken: Vec<String>,
    transient_failures: Mutex<HashMap<String, usize>>,
    fetches: AtomicUsize,
}

impl InMemoryQuoteSource {
    /// Create an empty source. Every symbol is unknown.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `points` for `symbol`.
    pub fn with_series(mut self, symbol: impl Into<String>, points: Vec<(NaiveDate, f64)>) -> Self {
        self.paths.insert(symbol.into(), points);
        self
    }

    /// Make every request for `symbol` fail with a provider error.
    pub fn with_provider_error(mut self, symbol: impl Into<String>) -> Self {
        self.broken.push(symbol.into());
        self
    }

    /// Fail the next `count` requests for `symbol` with a transient error.
    pub fn with_transient_failures(self, symbol: impl Into<String>, count: usize) -> Self {
        if let Ok(mut failures) = self.transient_failures.lock() {
            failures.insert(symbol.into(), count);
        }
        self
    }

    /// Number of requests served so far, failed ones included.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn take_transient_failure(&self, symbol: &str) -> bool {
        let Ok(mut failures) = self.transient_failures.lock() else {
            return false;
        };
        match failures.get_mut(symbol) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }

    fn lookup(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<DataFrame> {
        validate_request(symbol, start, end)?;
        self.fetches.fetch_add(1, Ordering::SeqCst);

        if self.broken.iter().any(|s| s == symbol) {
            return Err(DataError::YahooApi(format!("provider rejected {symbol}")));
        }
        if self.take_transient_failure(symbol) {
            return Err(DataError::YahooApi(format!("temporary failure for {symbol}")));
        }

        let points: Vec<(NaiveDate, f64)> = self
            .paths
            .get(symbol)
            .into_iter()
            .flatten()
            .filter(|(date, _)| *date >= start && *date < end)
            .copied()
            .collect();

        if points.is_empty() {
            return Err(DataError::MissingData {
                symbol: symbol.to_string(),
                reason: "No data in requested window".to_string(),
            });
        }

        quotes_frame(symbol, &points)
    }
}

impl QuoteSource for InMemoryQuoteSource {
    async fn fetch_quotes(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<DataFrame> {
        self.lookup(symbol, start, end)
    }
}
