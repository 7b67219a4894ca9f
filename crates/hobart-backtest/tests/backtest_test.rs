//! End-to-end backtests against an in-memory quote source.

use approx::assert_relative_eq;
use chrono::NaiveDate;
use hobart_backtest::{
    BacktestConfig, BacktestResult, Backtester, PortfolioAllocation, ReturnSeries, compute_metrics,
};
use hobart_data::{InMemoryQuoteSource, PriceSeries};

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 2, day).unwrap()
}

const ALPHA: [f64; 10] = [100.0, 102.0, 101.0, 104.0, 103.5, 105.0, 107.1, 106.0, 108.0, 110.0];
const BETA: [f64; 10] = [50.0, 49.5, 50.5, 51.0, 50.0, 49.0, 50.2, 51.5, 51.0, 52.3];

fn closes(prices: &[f64]) -> Vec<(NaiveDate, f64)> {
    prices
        .iter()
        .enumerate()
        .map(|(i, &p)| (d(i as u32 + 1), p))
        .collect()
}

fn simple_returns(prices: &[f64]) -> Vec<f64> {
    prices.windows(2).map(|w| w[1] / w[0] - 1.0).collect()
}

fn source() -> InMemoryQuoteSource {
    InMemoryQuoteSource::new()
        .with_series("ALPHA", closes(&ALPHA))
        .with_series("BETA", closes(&BETA))
}

#[tokio::test]
async fn test_ten_day_equal_weight_scenario() {
    let backtester = Backtester::new(source(), BacktestConfig::default().with_benchmark(None));
    let result = backtester
        .run_equal_weight(["ALPHA", "BETA"], d(1), d(29))
        .await
        .unwrap();

    let a = simple_returns(&ALPHA);
    let b = simple_returns(&BETA);
    let expected_total = a
        .iter()
        .zip(&b)
        .map(|(x, y)| 1.0 + (x + y) / 2.0)
        .product::<f64>()
        - 1.0;

    assert_eq!(result.trading_days, 10);
    assert_eq!(result.portfolio_returns.len(), 9);
    assert_relative_eq!(
        result.portfolio_metrics.total_return,
        expected_total * 100.0,
        max_relative = 1e-6
    );
    assert_relative_eq!(result.final_value, 100_000.0 * (1.0 + expected_total), max_relative = 1e-9);

    for (symbol, prices) in [("ALPHA", &ALPHA), ("BETA", &BETA)] {
        let own = ReturnSeries::from_prices(&PriceSeries::new(symbol, closes(prices)));
        let expected = compute_metrics(&own, None).unwrap();
        let actual = &result.individual_metrics[symbol];
        assert_relative_eq!(actual.total_return, expected.total_return, max_relative = 1e-12);
        assert_relative_eq!(actual.volatility, expected.volatility, max_relative = 1e-12);
        assert_relative_eq!(actual.max_drawdown, expected.max_drawdown, max_relative = 1e-12);
    }

    let corr = &result.correlation_matrix;
    assert_eq!(corr["ALPHA"]["ALPHA"], 1.0);
    assert_relative_eq!(corr["ALPHA"]["BETA"], corr["BETA"]["ALPHA"]);
}

#[tokio::test]
async fn test_weighted_portfolio_from_allocation_file() {
    let allocation = PortfolioAllocation::from_json(
        r#"{ "unit": "percent", "holdings": [
              { "ticker": "ALPHA", "weight": 75 },
              { "ticker": "BETA", "weight": 25 } ] }"#,
    )
    .unwrap();
    let weights = allocation.weights().unwrap();

    let backtester = Backtester::new(source(), BacktestConfig::default().with_benchmark(None));
    let result = backtester.run_weighted(&weights, d(1), d(29)).await.unwrap();

    assert!(result.weight_adjustment.is_none());
    let a = simple_returns(&ALPHA);
    let b = simple_returns(&BETA);
    for (t, r) in result.portfolio_returns.values().iter().enumerate() {
        assert_relative_eq!(*r, 0.75 * a[t] + 0.25 * b[t], epsilon = 1e-12);
    }
}

#[tokio::test]
async fn test_benchmark_comparison_and_json_artifact() {
    let source = source().with_series("SPY", closes(&[400.0, 402.0, 401.0, 405.0, 404.0, 406.0, 409.0, 408.0, 410.0, 412.0]));
    let backtester = Backtester::with_defaults(source);
    let result = backtester
        .run_equal_weight(["ALPHA", "BETA"], d(1), d(29))
        .await
        .unwrap();

    assert_eq!(result.benchmark.as_deref(), Some("SPY"));
    assert_eq!(result.tickers, vec!["ALPHA", "BETA"]);
    let comparison = result.portfolio_metrics.benchmark.unwrap();
    assert!(comparison.tracking_error > 0.0);

    let json = result.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(value["portfolio_metrics"]["alpha"].is_number());
    assert!(value["correlation_matrix"]["ALPHA"]["BETA"].is_number());
    assert_eq!(value["start_date"], "2024-02-01");
    assert_eq!(value["trading_days"], 10);

    let restored = BacktestResult::from_json(&json).unwrap();
    assert_eq!(restored.tickers, result.tickers);
    assert_eq!(restored.portfolio_value.len(), result.portfolio_value.len());
    assert!(restored.portfolio_metrics.benchmark.is_some());
}
