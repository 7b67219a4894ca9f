#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod export;
pub mod report;
pub mod summary;

#[cfg(test)]
mod test_support;

pub use export::{
    ExportError, ExportFormat, Exporter, MetricsRow, TrajectoryRow, metrics_rows, trajectory_rows,
};
pub use report::{render_markdown, render_text};
pub use summary::{PerformanceRating, RunSummary, format_money};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::result;

    #[test]
    fn test_summary_from_result() {
        let summary = RunSummary::from_result(&result(true, false));

        assert_eq!(summary.rating, PerformanceRating::Good);
        assert_eq!(summary.benchmark.as_deref(), Some("SPY"));
        assert_eq!(summary.beat_benchmark(), Some(true));
        assert!((summary.profit_loss - 1_949.4).abs() < 1e-6);

        let text = summary.to_string();
        assert!(text.contains("Profit/Loss:        $1,949.40 (+1.95%)"));
        assert!(text.contains("Portfolio outperformed SPY by 0.75%"));
    }

    #[test]
    fn test_summary_without_benchmark() {
        let summary = RunSummary::from_result(&result(false, false));
        assert_eq!(summary.alpha, None);
        assert_eq!(summary.beat_benchmark(), None);
        assert!(!summary.to_string().contains("outperformed"));
    }
}
