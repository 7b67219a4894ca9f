#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod acquire;
pub mod cache;
pub mod error;
pub mod memory;
pub mod series;
pub mod source;
pub mod yahoo;

pub use acquire::{Acquisition, fetch_historical_data};
pub use cache::{CacheStats, SqliteCache};
pub use error::{DataError, Result};
pub use memory::InMemoryQuoteSource;
pub use series::{PriceField, PriceSeries, quotes_frame};
pub use source::{CachedQuoteSource, FetchConfig, QuoteSource, RetryPolicy, RetryingQuoteSource};
pub use yahoo::YahooQuoteProvider;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
