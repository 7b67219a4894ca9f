//! Risk and return metrics for a daily return series
//!
//! All metrics assume 252 trading days per year and a 0% risk-free rate.
//! Percentage-style metrics are stored scaled by 100 (`12.5` means 12.5%);
//! ratios and correlations are stored unscaled.
//!
//! | Metric | Definition |
//! |---|---|
//! | total_return | ∏(1+r) − 1 |
//! | annualized_return | (1 + total_return)^(252/n) − 1 |
//! | volatility | stdev(r) × √252 |
//! | downside_volatility | stdev(r \| r < 0) × √252 |
//! | sharpe_ratio | annualized_return / volatility |
//! | sortino_ratio | annualized_return / downside_volatility |
//! | max_drawdown | min_t (cum_t − peak_t) / peak_t |
//! | win_rate | share of r > 0 |

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::returns::ReturnSeries;
use crate::stats::{mean, pearson, sample_std};

/// Trading days per year used for annualization
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Errors from metric computation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MetricsError {
    /// The return series has no observations
    #[error("Cannot compute metrics for an empty return series")]
    EmptySeries,
}

/// Benchmark-relative statistics.
///
/// Computed on the dates where both the portfolio and the benchmark have a
/// return; `alpha` compares against the benchmark's full-period total return.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkComparison {
    /// Pearson correlation with the benchmark
    pub correlation_to_benchmark: f64,
    /// Annualized standard deviation of excess returns (%)
    pub tracking_error: f64,
    /// Annualized mean excess return over tracking error
    pub information_ratio: f64,
    /// Total return minus benchmark total return (%)
    pub alpha: f64,
}

/// Performance metrics of one return series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSet {
    /// Compounded return over the period (%)
    pub total_return: f64,
    /// Geometric annualized return (%)
    pub annualized_return: f64,
    /// Annualized volatility (%)
    pub volatility: f64,
    /// Annualized volatility of negative returns (%)
    pub downside_volatility: f64,
    /// Annualized return per unit of volatility
    pub sharpe_ratio: f64,
    /// Annualized return per unit of downside volatility
    pub sortino_ratio: f64,
    /// Largest peak-to-trough decline, non-positive (%)
    pub max_drawdown: f64,
    /// Share of days with a positive return (%)
    pub win_rate: f64,
    /// Largest single-day return (%)
    pub best_day: f64,
    /// Smallest single-day return (%)
    pub worst_day: f64,
    /// Comparison against a benchmark, when one was supplied and overlaps
    #[serde(flatten, default, skip_serializing_if = "Option::is_none")]
    pub benchmark: Option<BenchmarkComparison>,
}

impl MetricSet {
    /// Alpha against the benchmark, if available
    pub fn alpha(&self) -> Option<f64> {
        self.benchmark.map(|b| b.alpha)
    }
}

/// Compute the metric set for `returns`, optionally against `benchmark`.
///
/// # Errors
/// Returns [`MetricsError::EmptySeries`] if `returns` is empty.
pub fn compute_metrics(
    returns: &ReturnSeries,
    benchmark: Option<&ReturnSeries>,
) -> Result<MetricSet, MetricsError> {
    let r = returns.values();
    if r.is_empty() {
        return Err(MetricsError::EmptySeries);
    }

    let n = r.len() as f64;
    let ann = TRADING_DAYS_PER_YEAR.sqrt();

    let total_return = total_return(r);
    let annualized_return = (1.0 + total_return).powf(TRADING_DAYS_PER_YEAR / n) - 1.0;

    let volatility = sample_std(r) * ann;
    let negatives: Vec<f64> = r.iter().copied().filter(|&x| x < 0.0).collect();
    let downside_volatility = sample_std(&negatives) * ann;

    let sharpe_ratio = safe_ratio(annualized_return, volatility);
    let sortino_ratio = safe_ratio(annualized_return, downside_volatility);

    let wins = r.iter().filter(|&&x| x > 0.0).count() as f64;
    let best_day = r.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let worst_day = r.iter().copied().fold(f64::INFINITY, f64::min);

    let benchmark = benchmark
        .filter(|b| !b.is_empty())
        .and_then(|b| compare(returns, b, total_return));

    Ok(MetricSet {
        total_return: total_return * 100.0,
        annualized_return: annualized_return * 100.0,
        volatility: volatility * 100.0,
        downside_volatility: downside_volatility * 100.0,
        sharpe_ratio,
        sortino_ratio,
        max_drawdown: max_drawdown(r) * 100.0,
        win_rate: wins / n * 100.0,
        best_day: best_day * 100.0,
        worst_day: worst_day * 100.0,
        benchmark,
    })
}

fn compare(returns: &ReturnSeries, benchmark: &ReturnSeries, total: f64) -> Option<BenchmarkComparison> {
    let (ours, theirs) = returns.intersect(benchmark);
    if ours.is_empty() {
        return None;
    }

    let excess: Vec<f64> = ours.iter().zip(&theirs).map(|(a, b)| a - b).collect();
    let tracking_error = sample_std(&excess) * TRADING_DAYS_PER_YEAR.sqrt();
    let information_ratio = safe_ratio(mean(&excess) * TRADING_DAYS_PER_YEAR, tracking_error);
    let benchmark_total = total_return(benchmark.values());

    Some(BenchmarkComparison {
        correlation_to_benchmark: pearson(&ours, &theirs),
        tracking_error: tracking_error * 100.0,
        information_ratio,
        alpha: (total - benchmark_total) * 100.0,
    })
}

fn total_return(r: &[f64]) -> f64 {
    r.iter().map(|x| 1.0 + x).product::<f64>() - 1.0
}

/// Worst decline of the compounded path from its running peak, as a
/// non-positive fraction. The peak starts at the first day's value.
fn max_drawdown(r: &[f64]) -> f64 {
    let mut cumulative = 1.0;
    let mut peak = f64::NEG_INFINITY;
    let mut worst: f64 = 0.0;

    for x in r {
        cumulative *= 1.0 + x;
        peak = peak.max(cumulative);
        if peak > 0.0 {
            worst = worst.min((cumulative - peak) / peak);
        }
    }

    worst
}

fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 { numerator / denominator } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(u64::from(day))
    }

    fn series(values: &[f64]) -> ReturnSeries {
        ReturnSeries::new((0..values.len() as u32).map(d).collect(), values.to_vec())
    }

    #[test]
    fn test_basic_metrics() {
        let metrics = compute_metrics(&series(&[0.01, -0.02, 0.03]), None).unwrap();

        // 1.01 * 0.98 * 1.03 - 1
        assert_relative_eq!(metrics.total_return, 1.9494, epsilon = 1e-9);
        assert_relative_eq!(metrics.best_day, 3.0, epsilon = 1e-12);
        assert_relative_eq!(metrics.worst_day, -2.0, epsilon = 1e-12);
        assert_relative_eq!(metrics.win_rate, 200.0 / 3.0, epsilon = 1e-9);
        // peak 1.01, trough 0.9898
        assert_relative_eq!(metrics.max_drawdown, -2.0, epsilon = 1e-9);
        assert_eq!(metrics.downside_volatility, 0.0);
        assert_eq!(metrics.sortino_ratio, 0.0);
        assert!(metrics.benchmark.is_none());
    }

    #[test]
    fn test_annualization() {
        let r = vec![0.001; 252];
        let metrics = compute_metrics(&series(&r), None).unwrap();
        // A full year annualizes to itself
        assert_relative_eq!(metrics.annualized_return, metrics.total_return, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_volatility_guard() {
        let metrics = compute_metrics(&series(&[0.001; 20]), None).unwrap();

        assert_eq!(metrics.volatility, 0.0);
        assert_eq!(metrics.sharpe_ratio, 0.0);
        assert!(metrics.sharpe_ratio.is_finite());
        assert_eq!(metrics.max_drawdown, 0.0);
        assert_eq!(metrics.win_rate, 100.0);
    }

    #[test]
    fn test_single_return() {
        let metrics = compute_metrics(&series(&[0.05]), None).unwrap();
        assert_eq!(metrics.volatility, 0.0);
        assert_eq!(metrics.sharpe_ratio, 0.0);
        assert_relative_eq!(metrics.total_return, 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_series() {
        assert_eq!(compute_metrics(&ReturnSeries::default(), None), Err(MetricsError::EmptySeries));
    }

    #[test]
    fn test_sortino_with_downside() {
        let metrics = compute_metrics(&series(&[0.02, -0.01, 0.01, -0.03, 0.02]), None).unwrap();
        assert!(metrics.downside_volatility > 0.0);
        assert_relative_eq!(
            metrics.sortino_ratio,
            metrics.annualized_return / metrics.downside_volatility,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_benchmark_comparison() {
        let portfolio = series(&[0.01, -0.02, 0.03, 0.00]);
        let benchmark = series(&[0.005, -0.01, 0.015, 0.001]);
        let metrics = compute_metrics(&portfolio, Some(&benchmark)).unwrap();

        let comparison = metrics.benchmark.unwrap();
        assert!(comparison.correlation_to_benchmark > 0.9);
        assert!(comparison.tracking_error > 0.0);

        let expected_alpha = metrics.total_return - ((1.005 * 0.99 * 1.015 * 1.001) - 1.0) * 100.0;
        assert_relative_eq!(comparison.alpha, expected_alpha, epsilon = 1e-9);
    }

    #[test]
    fn test_identical_benchmark() {
        let portfolio = series(&[0.01, -0.02, 0.03]);
        let metrics = compute_metrics(&portfolio, Some(&portfolio)).unwrap();
        let comparison = metrics.benchmark.unwrap();

        assert_eq!(comparison.tracking_error, 0.0);
        assert_eq!(comparison.information_ratio, 0.0);
        assert_relative_eq!(comparison.alpha, 0.0, epsilon = 1e-12);
        assert_relative_eq!(comparison.correlation_to_benchmark, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_disjoint_benchmark_is_omitted() {
        let portfolio = series(&[0.01, 0.02]);
        let benchmark = ReturnSeries::new(vec![d(10), d(11)], vec![0.01, 0.02]);
        let metrics = compute_metrics(&portfolio, Some(&benchmark)).unwrap();
        assert!(metrics.benchmark.is_none());
    }

    #[test]
    fn test_idempotent() {
        let r = series(&[0.01, -0.015, 0.007, 0.02, -0.004]);
        let b = series(&[0.005, -0.01, 0.004, 0.01, 0.0]);
        assert_eq!(compute_metrics(&r, Some(&b)), compute_metrics(&r, Some(&b)));
    }

    #[test]
    fn test_serialized_field_names() {
        let portfolio = series(&[0.01, -0.02, 0.03]);
        let with = serde_json::to_value(compute_metrics(&portfolio, Some(&portfolio)).unwrap()).unwrap();
        let without = serde_json::to_value(compute_metrics(&portfolio, None).unwrap()).unwrap();

        assert!(with.get("alpha").is_some());
        assert!(with.get("information_ratio").is_some());
        assert!(without.get("alpha").is_none());
        assert!(without.get("sharpe_ratio").is_some());
    }
}
