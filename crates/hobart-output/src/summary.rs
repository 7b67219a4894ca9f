//! Headline summary of a backtest run.

use hobart_backtest::BacktestResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Qualitative rating derived from the Sharpe ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PerformanceRating {
    /// Sharpe ratio at or below 0.5
    Poor,
    /// Sharpe ratio above 0.5
    Fair,
    /// Sharpe ratio above 1.0
    Good,
    /// Sharpe ratio above 2.0
    Excellent,
}

impl PerformanceRating {
    /// Rate a Sharpe ratio.
    pub fn from_sharpe(sharpe: f64) -> Self {
        if sharpe > 2.0 {
            Self::Excellent
        } else if sharpe > 1.0 {
            Self::Good
        } else if sharpe > 0.5 {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    /// Human-readable label.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
        }
    }
}

impl fmt::Display for PerformanceRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Headline numbers of a backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Starting capital.
    pub initial_capital: f64,

    /// Value after the last trading day.
    pub final_value: f64,

    /// `final_value - initial_capital`.
    pub profit_loss: f64,

    /// Total return (%).
    pub total_return: f64,

    /// Annualized Sharpe ratio.
    pub sharpe_ratio: f64,

    /// Rating derived from the Sharpe ratio.
    pub rating: PerformanceRating,

    /// Benchmark ticker, when a comparison was made.
    pub benchmark: Option<String>,

    /// Excess total return over the benchmark (%).
    pub alpha: Option<f64>,
}

impl RunSummary {
    /// Summarize a result.
    pub fn from_result(result: &BacktestResult) -> Self {
        let metrics = &result.portfolio_metrics;
        let alpha = metrics.alpha();
        Self {
            initial_capital: result.initial_capital,
            final_value: result.final_value,
            profit_loss: result.profit_loss(),
            total_return: metrics.total_return,
            sharpe_ratio: metrics.sharpe_ratio,
            rating: PerformanceRating::from_sharpe(metrics.sharpe_ratio),
            benchmark: alpha.and(result.benchmark.clone()),
            alpha,
        }
    }

    /// Whether the portfolio beat its benchmark.
    pub fn beat_benchmark(&self) -> Option<bool> {
        self.alpha.map(|a| a > 0.0)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Initial Investment: {}", format_money(self.initial_capital))?;
        writeln!(f, "Final Value:        {}", format_money(self.final_value))?;
        writeln!(
            f,
            "Profit/Loss:        {} ({:+.2}%)",
            format_money(self.profit_loss),
            self.total_return
        )?;
        writeln!(f, "Sharpe Ratio:       {:.2} ({})", self.sharpe_ratio, self.rating)?;
        if let (Some(alpha), Some(benchmark)) = (self.alpha, &self.benchmark) {
            let verdict = if alpha > 0.0 { "outperformed" } else { "underperformed" };
            writeln!(f, "Portfolio {verdict} {benchmark} by {:.2}%", alpha.abs())?;
        }
        Ok(())
    }
}

/// Format an amount as dollars with thousands separators, e.g. `$1,234.50`.
pub fn format_money(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{sign}${grouped}.{cents}")
}
