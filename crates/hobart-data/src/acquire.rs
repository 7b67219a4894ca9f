//! Best-effort acquisition of price history for many tickers.

use crate::series::{PriceField, PriceSeries};
use crate::source::QuoteSource;
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

/// Outcome of fetching a set of tickers.
///
/// Tickers for which the provider returned nothing, or failed, are listed in
/// `missing` instead of aborting the whole acquisition.
#[derive(Debug, Clone, Default)]
pub struct Acquisition {
    /// Price series for every ticker that returned data, in request order.
    pub series: Vec<PriceSeries>,
    /// Requested tickers that returned no usable data, in request order.
    pub missing: Vec<String>,
}

impl Acquisition {
    /// Whether fewer tickers came back than were requested.
    pub fn is_partial(&self) -> bool {
        !self.missing.is_empty()
    }

    /// Series for `symbol`, if it was fetched.
    pub fn get(&self, symbol: &str) -> Option<&PriceSeries> {
        self.series.iter().find(|s| s.symbol() == symbol)
    }
}

/// Fetch close-price history for `symbols` over `[start, end)`.
///
/// Up to `concurrency` requests are in flight at once; the result does not
/// depend on completion order. Duplicate symbols are fetched once.
pub async fn fetch_historical_data<S: QuoteSource>(
    source: &S,
    symbols: &[String],
    start: NaiveDate,
    end: NaiveDate,
    field: PriceField,
    concurrency: usize,
) -> Acquisition {
    let mut unique: Vec<String> = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        if !unique.contains(symbol) {
            unique.push(symbol.clone());
        }
    }

    info!(
        tickers = unique.len(),
        %start,
        %end,
        "fetching historical data"
    );

    let results: Vec<(String, Option<PriceSeries>)> = stream::iter(unique)
        .map(|symbol| async move {
            let series = match source.fetch_quotes(&symbol, start, end).await {
                Ok(df) => match PriceSeries::from_quotes(&symbol, &df, field) {
                    Ok(series) if !series.is_empty() => {
                        debug!(symbol = %symbol, days = series.len(), "received price history");
                        Some(series)
                    }
                    Ok(_) => {
                        warn!(symbol = %symbol, "no usable prices in provider response");
                        None
                    }
                    Err(e) => {
                        warn!(symbol = %symbol, error = %e, "could not read provider response");
                        None
                    }
                },
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "failed to fetch data");
                    None
                }
            };
            (symbol, series)
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut acquisition = Acquisition::default();
    for (symbol, series) in results {
        match series {
            Some(series) => acquisition.series.push(series),
            None => acquisition.missing.push(symbol),
        }
    }

    if acquisition.is_partial() {
        warn!(
            fetched = acquisition.series.len(),
            missing = ?acquisition.missing,
            "partial data coverage"
        );
    }

    acquisition
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryQuoteSource;
    use rstest::rstest;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn source() -> InMemoryQuoteSource {
        InMemoryQuoteSource::new()
            .with_series("AAPL", vec![(d(2), 100.0), (d(3), 101.0)])
            .with_series("MSFT", vec![(d(2), 200.0), (d(3), 202.0)])
            .with_series("BROKEN", vec![(d(2), 1.0)])
            .with_provider_error("BROKEN")
    }

    fn fetched(acquisition: &Acquisition) -> Vec<&str> {
        acquisition.series.iter().map(|s| s.symbol()).collect()
    }

    fn tickers(symbols: &[&str]) -> Vec<String> {
        symbols.iter().map(|s| s.to_string()).collect()
    }

    #[rstest]
    #[case(1)]
    #[case(4)]
    #[tokio::test]
    async fn test_full_coverage(#[case] concurrency: usize) {
        let source = source();
        let acquisition = fetch_historical_data(
            &source,
            &tickers(&["MSFT", "AAPL"]),
            d(1),
            d(10),
            PriceField::Close,
            concurrency,
        )
        .await;

        assert!(!acquisition.is_partial());
        assert_eq!(fetched(&acquisition), vec!["MSFT", "AAPL"]);
        assert_eq!(acquisition.get("AAPL").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_and_failing_tickers_are_skipped() {
        let source = source();
        let acquisition = fetch_historical_data(
            &source,
            &tickers(&["AAPL", "NOPE", "BROKEN", "MSFT"]),
            d(1),
            d(10),
            PriceField::Close,
            1,
        )
        .await;

        assert!(acquisition.is_partial());
        assert_eq!(fetched(&acquisition), vec!["AAPL", "MSFT"]);
        assert_eq!(acquisition.missing, vec!["NOPE", "BROKEN"]);
    }

    #[tokio::test]
    async fn test_duplicates_fetched_once() {
        let source = source();
        let acquisition = fetch_historical_data(
            &source,
            &tickers(&["AAPL", "AAPL"]),
            d(1),
            d(10),
            PriceField::Close,
            1,
        )
        .await;

        assert_eq!(acquisition.series.len(), 1);
        assert_eq!(source.fetch_count(), 1);
    }
}
