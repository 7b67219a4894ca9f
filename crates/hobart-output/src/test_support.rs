//! Hand-built results for rendering tests.

use chrono::NaiveDate;
use hobart_backtest::{
    BacktestResult, BenchmarkComparison, MetricSet, PortfolioWeights, ReturnSeries, ValuePoint,
};
use std::collections::BTreeMap;

pub(crate) fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
}

pub(crate) fn metrics(total_return: f64, sharpe_ratio: f64) -> MetricSet {
    MetricSet {
        total_return,
        annualized_return: total_return * 2.0,
        volatility: 18.5,
        downside_volatility: 12.25,
        sharpe_ratio,
        sortino_ratio: sharpe_ratio * 1.4,
        max_drawdown: -7.5,
        win_rate: 55.0,
        best_day: 3.2,
        worst_day: -2.9,
        benchmark: None,
    }
}

pub(crate) fn result(with_benchmark: bool, weighted: bool) -> BacktestResult {
    let mut portfolio_metrics = metrics(1.9494, 1.35);
    if with_benchmark {
        portfolio_metrics.benchmark = Some(BenchmarkComparison {
            correlation_to_benchmark: 0.82,
            tracking_error: 6.1,
            information_ratio: 0.44,
            alpha: 0.75,
        });
    }

    let mut individual_metrics = BTreeMap::new();
    individual_metrics.insert("AAPL".to_string(), metrics(2.5, 1.1));
    individual_metrics.insert("MSFT".to_string(), metrics(1.4, 0.9));

    let mut correlation_matrix = BTreeMap::new();
    for a in ["AAPL", "MSFT"] {
        let row: BTreeMap<String, f64> = [("AAPL", 0.6), ("MSFT", 0.6)]
            .into_iter()
            .map(|(b, rho)| (b.to_string(), if a == b { 1.0 } else { rho }))
            .collect();
        correlation_matrix.insert(a.to_string(), row);
    }

    let portfolio_weights = weighted.then(|| {
        PortfolioWeights::new(vec![("AAPL".to_string(), 0.6), ("MSFT".to_string(), 0.4)]).unwrap()
    });

    BacktestResult {
        portfolio_metrics,
        individual_metrics,
        portfolio_weights,
        weight_adjustment: None,
        portfolio_returns: ReturnSeries::new(vec![d(3), d(4), d(5)], vec![0.01, -0.02, 0.03]),
        portfolio_value: vec![
            ValuePoint { date: d(3), value: 101_000.0 },
            ValuePoint { date: d(4), value: 98_980.0 },
            ValuePoint { date: d(5), value: 101_949.4 },
        ],
        initial_capital: 100_000.0,
        final_value: 101_949.4,
        total_return_pct: 1.9494,
        correlation_matrix,
        tickers: vec!["AAPL".to_string(), "MSFT".to_string()],
        missing_tickers: Vec::new(),
        benchmark: with_benchmark.then(|| "SPY".to_string()),
        start_date: d(2),
        end_date: d(6),
        trading_days: 4,
    }
}
