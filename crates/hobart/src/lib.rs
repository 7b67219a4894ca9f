#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod sample;
pub mod universe;

// Re-export main types from sub-crates
pub use hobart_backtest as backtest;
pub use hobart_data as data;
pub use hobart_output as output;

pub use sample::{SAMPLE_WEIGHTS, sample_tickers, sample_weights};
pub use universe::{Constituent, DefaultUniverse, GicsSector, Universe};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
