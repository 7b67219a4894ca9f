//! Export of backtest results to CSV and JSON.
//!
//! JSON carries the complete result and is the artifact meant to be kept.
//! CSV is tabular: the portfolio value trajectory for a result, a metrics
//! table for per-ticker metrics.

use chrono::NaiveDate;
use hobart_backtest::{BacktestResult, MetricSet};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

use crate::summary::RunSummary;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }

    /// Guess the format from a file path; `.json` is pretty-printed.
    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("csv") => Ok(Self::Csv),
            Some("json") => Ok(Self::PrettyJson),
            other => Err(ExportError::InvalidFormat(format!(
                "unsupported file extension: {}",
                other.unwrap_or("<none>")
            ))),
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

/// One row of the value trajectory CSV.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrajectoryRow {
    /// Trading date.
    pub date: NaiveDate,

    /// Portfolio daily return (fraction).
    pub daily_return: f64,

    /// Portfolio value at the close.
    pub value: f64,
}

/// Per-ticker metrics flattened for CSV.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricsRow {
    /// Ticker symbol, or `PORTFOLIO`.
    pub symbol: String,
    /// Total return (%).
    pub total_return: f64,
    /// Annualized return (%).
    pub annualized_return: f64,
    /// Annualized volatility (%).
    pub volatility: f64,
    /// Sharpe ratio.
    pub sharpe_ratio: f64,
    /// Sortino ratio.
    pub sortino_ratio: f64,
    /// Maximum drawdown (%).
    pub max_drawdown: f64,
    /// Win rate (%).
    pub win_rate: f64,
}

impl MetricsRow {
    fn new(symbol: &str, m: &MetricSet) -> Self {
        Self {
            symbol: symbol.to_string(),
            total_return: m.total_return,
            annualized_return: m.annualized_return,
            volatility: m.volatility,
            sharpe_ratio: m.sharpe_ratio,
            sortino_ratio: m.sortino_ratio,
            max_drawdown: m.max_drawdown,
            win_rate: m.win_rate,
        }
    }
}

/// Portfolio value trajectory of a result, one row per return date.
pub fn trajectory_rows(result: &BacktestResult) -> Vec<TrajectoryRow> {
    result
        .portfolio_value
        .iter()
        .zip(result.portfolio_returns.values())
        .map(|(point, &daily_return)| TrajectoryRow {
            date: point.date,
            daily_return,
            value: point.value,
        })
        .collect()
}

/// Portfolio metrics followed by each ticker's metrics, in ticker order.
pub fn metrics_rows(result: &BacktestResult) -> Vec<MetricsRow> {
    let mut rows = vec![MetricsRow::new("PORTFOLIO", &result.portfolio_metrics)];
    rows.extend(
        result
            .tickers
            .iter()
            .filter_map(|t| result.individual_metrics.get(t).map(|m| MetricsRow::new(t, m))),
    );
    rows
}

fn to_csv<T: Serialize>(records: &[T]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in records {
        wtr.serialize(record)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
}

impl Exporter for BacktestResult {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => to_csv(&trajectory_rows(self)),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

impl Exporter for Vec<MetricsRow> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => to_csv(self),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

impl Exporter for RunSummary {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => to_csv(std::slice::from_ref(self)),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}
