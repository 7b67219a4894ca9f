#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod align;
pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod result;
pub mod returns;
mod stats;
pub mod weights;

pub use align::{AlignmentError, PriceMatrix, align_prices};
pub use config::{BacktestConfig, ConfigError};
pub use engine::{Allocation, BacktestRequest, Backtester, parse_date};
pub use error::{BacktestError, Result};
pub use metrics::{BenchmarkComparison, MetricSet, MetricsError, TRADING_DAYS_PER_YEAR, compute_metrics};
pub use result::{BacktestResult, ValuePoint};
pub use returns::{CorrelationMatrix, ReturnMatrix, ReturnSeries};
pub use weights::{
    Holding, PortfolioAllocation, PortfolioWeights, WEIGHT_SUM_TOLERANCE, WeightAdjustment, WeightError,
    WeightUnit,
};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
