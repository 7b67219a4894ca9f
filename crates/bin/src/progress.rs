//! Terminal progress for quote fetching.

use chrono::NaiveDate;
use hobart_data::{QuoteSource, Result};
use indicatif::{ProgressBar, ProgressStyle};
use polars::prelude::DataFrame;
use std::time::Duration;

/// Quote source that advances a progress bar after every request.
#[derive(Debug)]
pub(crate) struct ProgressQuoteSource<S> {
    inner: S,
    bar: ProgressBar,
}

impl<S: QuoteSource> ProgressQuoteSource<S> {
    /// Wrap `inner`, expecting `total` requests.
    pub(crate) fn new(inner: S, total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map(|style| style.progress_chars("█▓░"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(100));
        bar.set_message("Fetching price history...");
        Self { inner, bar }
    }

    /// Hidden bar, for non-interactive output.
    pub(crate) fn hidden(inner: S) -> Self {
        Self {
            inner,
            bar: ProgressBar::hidden(),
        }
    }

    /// Stop the bar, leaving `message` on screen.
    pub(crate) fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

impl<S: QuoteSource> QuoteSource for ProgressQuoteSource<S> {
    async fn fetch_quotes(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<DataFrame> {
        self.bar.set_message(format!("Fetching {symbol}..."));
        let result = self.inner.fetch_quotes(symbol, start, end).await;
        self.bar.inc(1);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hobart_data::InMemoryQuoteSource;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[tokio::test]
    async fn test_counts_every_request() {
        let memory = InMemoryQuoteSource::new().with_series("AAPL", vec![(d(2), 1.0), (d(3), 1.1)]);
        let source = ProgressQuoteSource::hidden(&memory);

        assert!(source.fetch_quotes("AAPL", d(1), d(5)).await.is_ok());
        assert!(source.fetch_quotes("NOPE", d(1), d(5)).await.is_err());
        assert_eq!(source.bar.position(), 2);
        assert_eq!(memory.fetch_count(), 2);
    }
}
