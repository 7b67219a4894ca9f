//! The backtest engine
//!
//! A [`Backtester`] owns a [`QuoteSource`] and a [`BacktestConfig`] and turns
//! a [`BacktestRequest`] into a [`BacktestResult`]:
//!
//! 1. normalize weights (weighted runs only)
//! 2. fetch every ticker plus the benchmark, best effort
//! 3. align the portfolio tickers and compute daily returns
//! 4. blend returns (row mean or weighted sum)
//! 5. compute portfolio, per-ticker and benchmark metrics
//! 6. compound the initial capital through the portfolio returns

use chrono::NaiveDate;
use hobart_data::{PriceSeries, QuoteSource, fetch_historical_data};
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::align::align_prices;
use crate::config::BacktestConfig;
use crate::error::{BacktestError, Result};
use crate::metrics::compute_metrics;
use crate::result::{BacktestResult, ValuePoint};
use crate::returns::ReturnSeries;
use crate::weights::PortfolioWeights;

/// How ticker returns are combined into a portfolio return
#[derive(Debug, Clone, PartialEq)]
pub enum Allocation {
    /// Arithmetic mean across tickers on each date
    EqualWeight,
    /// Weighted sum with the given weights
    Weighted(PortfolioWeights),
}

/// One backtest to run
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestRequest {
    /// Tickers to hold, upper-cased, without duplicates
    pub tickers: Vec<String>,
    /// First date of the window
    pub start: NaiveDate,
    /// End of the window (exclusive)
    pub end: NaiveDate,
    /// Blending rule
    pub allocation: Allocation,
}

impl BacktestRequest {
    /// Equal-weight portfolio over `tickers`.
    pub fn equal_weight<I, T>(tickers: I, start: NaiveDate, end: NaiveDate) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        Self {
            tickers: normalize_tickers(tickers),
            start,
            end,
            allocation: Allocation::EqualWeight,
        }
    }

    /// Weighted portfolio; the tickers are the weighted symbols.
    pub fn weighted(weights: PortfolioWeights, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            tickers: weights.symbols(),
            start,
            end,
            allocation: Allocation::Weighted(weights),
        }
    }

    /// Parse `YYYY-MM-DD` dates for an equal-weight request.
    pub fn parse<I, T>(tickers: I, start: &str, end: &str) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        Ok(Self::equal_weight(tickers, parse_date(start)?, parse_date(end)?))
    }

    fn validate(&self) -> Result<()> {
        if self.tickers.is_empty() {
            return Err(BacktestError::InvalidInput("no tickers given".to_string()));
        }
        if self.start >= self.end {
            return Err(BacktestError::InvalidInput(format!(
                "start date {} must be before end date {}",
                self.start, self.end
            )));
        }
        Ok(())
    }
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|e| BacktestError::InvalidInput(format!("invalid date '{input}': {e}")))
}

fn normalize_tickers<I, T>(tickers: I) -> Vec<String>
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for ticker in tickers {
        let ticker = ticker.as_ref().trim().to_uppercase();
        if !ticker.is_empty() && !out.contains(&ticker) {
            out.push(ticker);
        }
    }
    out
}

/// Runs backtests against a quote source.
///
/// Holds no per-run state; one instance can serve many runs.
#[derive(Debug)]
pub struct Backtester<S> {
    source: S,
    config: BacktestConfig,
}

impl<S: QuoteSource> Backtester<S> {
    /// Create a backtester
    pub const fn new(source: S, config: BacktestConfig) -> Self {
        Self { source, config }
    }

    /// Create a backtester with the default configuration
    pub fn with_defaults(source: S) -> Self {
        Self::new(source, BacktestConfig::default())
    }

    /// Engine configuration
    pub const fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Underlying quote source
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Backtest an equal-weight portfolio of `tickers` over `[start, end)`.
    pub async fn run_equal_weight<I, T>(&self, tickers: I, start: NaiveDate, end: NaiveDate) -> Result<BacktestResult>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.run(&BacktestRequest::equal_weight(tickers, start, end)).await
    }

    /// Backtest a weighted portfolio over `[start, end)`.
    ///
    /// Weights whose sum is off by more than 1% are rescaled before any data
    /// is fetched; the rescaling is recorded in the result.
    pub async fn run_weighted(
        &self,
        weights: &PortfolioWeights,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BacktestResult> {
        self.run(&BacktestRequest::weighted(weights.clone(), start, end)).await
    }

    /// Run several requests in order, continuing past failures.
    pub async fn run_batch(&self, requests: &[BacktestRequest]) -> Vec<Result<BacktestResult>> {
        let mut results = Vec::with_capacity(requests.len());
        for (i, request) in requests.iter().enumerate() {
            let result = self.run(request).await;
            if let Err(e) = &result {
                warn!(request = i, error = %e, "backtest failed");
            }
            results.push(result);
        }
        results
    }

    /// Run a single request.
    pub async fn run(&self, request: &BacktestRequest) -> Result<BacktestResult> {
        request.validate()?;
        self.config
            .validate()
            .map_err(|e| BacktestError::InvalidInput(e.to_string()))?;

        let (weights, weight_adjustment) = match &request.allocation {
            Allocation::EqualWeight => (None, None),
            Allocation::Weighted(weights) => {
                let (normalized, adjustment) = weights.normalized();
                if let Some(adj) = &adjustment {
                    warn!(
                        original_sum = adj.original_sum,
                        "portfolio weights do not sum to 1.0, renormalizing"
                    );
                }
                (Some(normalized), adjustment)
            }
        };

        info!(
            tickers = request.tickers.len(),
            start = %request.start,
            end = %request.end,
            weighted = weights.is_some(),
            "starting backtest"
        );

        // The benchmark is a yardstick, never a holding
        let benchmark = self.config.benchmark.clone();
        let holdings: Vec<String> = request
            .tickers
            .iter()
            .filter(|t| Some(*t) != benchmark.as_ref())
            .cloned()
            .collect();
        if holdings.len() < request.tickers.len() {
            warn!(
                benchmark = benchmark.as_deref().unwrap_or_default(),
                "benchmark listed as a ticker, excluding it from the portfolio"
            );
        }
        if holdings.is_empty() {
            return Err(BacktestError::InvalidInput(
                "no tickers left once the benchmark is excluded".to_string(),
            ));
        }

        let mut symbols = holdings.clone();
        symbols.extend(benchmark.iter().cloned());

        let acquisition = fetch_historical_data(
            &self.source,
            &symbols,
            request.start,
            request.end,
            self.config.price_field,
            self.config.concurrency,
        )
        .await;

        let benchmark_returns = benchmark
            .as_deref()
            .and_then(|b| acquisition.get(b))
            .map(ReturnSeries::from_prices)
            .filter(|r| !r.is_empty());
        if let (Some(b), None) = (&benchmark, &benchmark_returns) {
            warn!(benchmark = %b, "no benchmark data, skipping benchmark comparison");
        }

        let series: Vec<PriceSeries> = holdings
            .iter()
            .filter_map(|t| acquisition.get(t).cloned())
            .collect();
        let missing: Vec<String> = holdings
            .iter()
            .filter(|t| acquisition.get(t).is_none())
            .cloned()
            .collect();

        if !missing.is_empty() && self.config.require_full_coverage {
            return Err(BacktestError::IncompleteCoverage { missing });
        }
        if series.is_empty() {
            return Err(BacktestError::NoOverlap);
        }

        let prices = align_prices(&series)?;
        if prices.len() < 2 {
            return Err(BacktestError::InsufficientData {
                observations: prices.len(),
            });
        }

        let returns = prices.returns();
        let portfolio_returns = match &weights {
            Some(w) => returns.weighted(w),
            None => returns.equal_weight(),
        };

        let portfolio_metrics = compute_metrics(&portfolio_returns, benchmark_returns.as_ref())?;

        let mut individual_metrics = BTreeMap::new();
        for symbol in returns.symbols() {
            if let Some(column) = returns.column(symbol) {
                individual_metrics.insert(symbol.clone(), compute_metrics(&column, None)?);
            }
        }

        let initial_capital = self.config.initial_capital;
        let portfolio_value: Vec<ValuePoint> = portfolio_returns
            .dates()
            .iter()
            .zip(portfolio_returns.compound(initial_capital))
            .map(|(&date, value)| ValuePoint { date, value })
            .collect();
        let final_value = portfolio_value.last().map_or(initial_capital, |p| p.value);

        info!(
            trading_days = prices.len(),
            final_value,
            total_return = portfolio_metrics.total_return,
            "backtest complete"
        );

        Ok(BacktestResult {
            portfolio_metrics,
            individual_metrics,
            portfolio_weights: weights,
            weight_adjustment,
            correlation_matrix: returns.correlation_matrix(),
            portfolio_returns,
            portfolio_value,
            initial_capital,
            final_value,
            total_return_pct: (final_value / initial_capital - 1.0) * 100.0,
            tickers: prices.symbols().to_vec(),
            missing_tickers: missing,
            benchmark: benchmark_returns.is_some().then_some(benchmark).flatten(),
            start_date: request.start,
            end_date: request.end,
            trading_days: prices.len(),
        })
    }
}
