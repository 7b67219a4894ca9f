//! Error types for backtest runs.

use crate::align::AlignmentError;
use crate::metrics::MetricsError;
use crate::weights::WeightError;
use thiserror::Error;

/// Result type for backtest operations.
pub type Result<T> = std::result::Result<T, BacktestError>;

/// Errors that abort a backtest run.
#[derive(Error, Debug)]
pub enum BacktestError {
    /// The request itself is malformed
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No usable date on which every ticker has a price
    #[error("No overlapping price data for the requested tickers and period")]
    NoOverlap,

    /// Aligned data is too short to produce a single return
    #[error("Insufficient data: {observations} aligned trading day(s), need at least 2")]
    InsufficientData {
        /// Number of aligned price rows
        observations: usize,
    },

    /// Some tickers returned no data and full coverage was required
    #[error("No data for tickers: {}", missing.join(", "))]
    IncompleteCoverage {
        /// Tickers without data
        missing: Vec<String>,
    },

    /// Invalid portfolio weights
    #[error("Weight error: {0}")]
    Weights(#[from] WeightError),

    /// Metric computation failed
    #[error("Metrics error: {0}")]
    Metrics(#[from] MetricsError),
}

impl From<AlignmentError> for BacktestError {
    fn from(_: AlignmentError) -> Self {
        // Both "nothing to align" and "nothing in common" leave no usable data
        Self::NoOverlap
    }
}
