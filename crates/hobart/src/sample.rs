//! A sample eight-stock portfolio.

use hobart_backtest::{PortfolioWeights, WeightError};

/// Tickers of the sample portfolio and their weights.
pub const SAMPLE_WEIGHTS: [(&str, f64); 8] = [
    ("AAPL", 0.20),
    ("MSFT", 0.20),
    ("GOOGL", 0.15),
    ("NVDA", 0.15),
    ("JPM", 0.10),
    ("JNJ", 0.10),
    ("V", 0.05),
    ("PG", 0.05),
];

/// Tickers of the sample portfolio.
pub fn sample_tickers() -> Vec<String> {
    SAMPLE_WEIGHTS.iter().map(|(s, _)| s.to_string()).collect()
}

/// Weights of the sample portfolio.
pub fn sample_weights() -> Result<PortfolioWeights, WeightError> {
    PortfolioWeights::new(SAMPLE_WEIGHTS.iter().map(|(s, w)| (s.to_string(), *w)))
}
