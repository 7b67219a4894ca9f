//! Backtest output record

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::metrics::MetricSet;
use crate::returns::{CorrelationMatrix, ReturnSeries};
use crate::weights::{PortfolioWeights, WeightAdjustment};

/// Portfolio value on one date
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValuePoint {
    /// Trading date
    pub date: NaiveDate,
    /// Portfolio value at the close
    pub value: f64,
}

/// Everything a backtest run produces.
///
/// Results are plain values owned by the caller; the engine keeps no copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Metrics of the blended portfolio, with benchmark comparison if any
    pub portfolio_metrics: MetricSet,
    /// Metrics of each ticker on its own, keyed by ticker
    pub individual_metrics: BTreeMap<String, MetricSet>,
    /// Weights used, present for weighted runs only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portfolio_weights: Option<PortfolioWeights>,
    /// Renormalization applied to the supplied weights, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_adjustment: Option<WeightAdjustment>,
    /// Daily returns of the blended portfolio
    pub portfolio_returns: ReturnSeries,
    /// Compounded portfolio value, one point per return
    pub portfolio_value: Vec<ValuePoint>,
    /// Starting capital
    pub initial_capital: f64,
    /// Value after the last trading day
    pub final_value: f64,
    /// `(final_value / initial_capital - 1) * 100`
    pub total_return_pct: f64,
    /// Pairwise correlation of the tickers' daily returns
    pub correlation_matrix: CorrelationMatrix,
    /// Tickers that contributed data, in request order
    pub tickers: Vec<String>,
    /// Requested tickers without data
    #[serde(default)]
    pub missing_tickers: Vec<String>,
    /// Benchmark ticker used for comparison
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benchmark: Option<String>,
    /// Requested start date
    pub start_date: NaiveDate,
    /// Requested end date (exclusive)
    pub end_date: NaiveDate,
    /// Number of aligned price dates
    pub trading_days: usize,
}

impl BacktestResult {
    /// Profit or loss over the period
    pub fn profit_loss(&self) -> f64 {
        self.final_value - self.initial_capital
    }

    /// Whether any requested ticker is missing from the result
    pub fn is_partial(&self) -> bool {
        !self.missing_tickers.is_empty()
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a result previously written by [`Self::to_json`]
    pub fn from_json(input: &str) -> serde_json::Result<Self> {
        serde_json::from_str(input)
    }
}
