//! Backtest configuration

use hobart_data::{PriceField, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML for this schema
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

fn default_initial_capital() -> f64 {
    100_000.0
}

fn default_benchmark() -> Option<String> {
    Some("SPY".to_string())
}

const fn default_concurrency() -> usize {
    1
}

/// Engine settings.
///
/// Every field has a default, so an empty TOML file is a valid config:
///
/// ```toml
/// initial_capital = 250000.0
/// benchmark = "QQQ"
/// concurrency = 4
/// require_full_coverage = true
///
/// [retry]
/// max_attempts = 5
/// base_delay = 250
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Starting portfolio value
    #[serde(default = "default_initial_capital")]
    pub initial_capital: f64,

    /// Benchmark ticker, `None` to skip benchmark comparison
    #[serde(default = "default_benchmark")]
    pub benchmark: Option<String>,

    /// Maximum number of concurrent quote requests
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Fail instead of warning when some tickers return no data
    #[serde(default)]
    pub require_full_coverage: bool,

    /// Price column used to compute returns
    #[serde(default)]
    pub price_field: PriceField,

    /// Retry behavior for transient provider failures
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: default_initial_capital(),
            benchmark: default_benchmark(),
            concurrency: default_concurrency(),
            require_full_coverage: false,
            price_field: PriceField::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl BacktestConfig {
    /// Load and validate a TOML config file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate TOML.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "initial_capital must be positive, got {}",
                self.initial_capital
            )));
        }
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid("concurrency must be at least 1".to_string()));
        }
        if self.benchmark.as_deref().is_some_and(|b| b.trim().is_empty()) {
            return Err(ConfigError::Invalid("benchmark must not be blank".to_string()));
        }
        Ok(())
    }

    /// Same configuration with a different starting capital
    pub const fn with_initial_capital(mut self, initial_capital: f64) -> Self {
        self.initial_capital = initial_capital;
        self
    }

    /// Same configuration with a different (or no) benchmark
    pub fn with_benchmark(mut self, benchmark: Option<String>) -> Self {
        self.benchmark = benchmark.map(|b| b.trim().to_uppercase());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_defaults() {
        let config = BacktestConfig::default();
        assert_eq!(config.initial_capital, 100_000.0);
        assert_eq!(config.benchmark.as_deref(), Some("SPY"));
        assert_eq!(config.concurrency, 1);
        assert!(!config.require_full_coverage);
        assert_eq!(config.price_field, PriceField::AdjustedClose);
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(BacktestConfig::from_toml("").unwrap(), BacktestConfig::default());
    }

    #[test]
    fn test_parse_toml() {
        let config = BacktestConfig::from_toml(
            r#"
            initial_capital = 250000.0
            benchmark = "QQQ"
            concurrency = 4
            require_full_coverage = true
            price_field = "close"

            [retry]
            max_attempts = 5
            base_delay = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.initial_capital, 250_000.0);
        assert_eq!(config.benchmark.as_deref(), Some("QQQ"));
        assert_eq!(config.concurrency, 4);
        assert!(config.require_full_coverage);
        assert_eq!(config.price_field, PriceField::Close);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_delay, Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            BacktestConfig::from_toml("initial_capital = -5.0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            BacktestConfig::from_toml("concurrency = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            BacktestConfig::from_toml("concurrency = \"many\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_builders() {
        let config = BacktestConfig::default()
            .with_initial_capital(5_000.0)
            .with_benchmark(Some(" qqq ".to_string()));
        assert_eq!(config.initial_capital, 5_000.0);
        assert_eq!(config.benchmark.as_deref(), Some("QQQ"));
        assert_eq!(BacktestConfig::default().with_benchmark(None).benchmark, None);
    }
}
