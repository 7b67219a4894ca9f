//! Date alignment of price histories
//!
//! Histories from different tickers rarely share an identical calendar:
//! listings start late, symbols halt, data vendors drop days. Alignment builds
//! the union of all observed dates, forward-fills each ticker's gaps *inside*
//! its own observed range, and keeps only the dates on which every ticker has
//! a (possibly filled) price.
//!
//! Filling stops at a ticker's last observation. Two histories that never
//! overlap therefore produce an empty intersection instead of a stale-price
//! matrix.

use chrono::NaiveDate;
use hobart_data::PriceSeries;
use ndarray::Array2;
use std::collections::BTreeSet;
use thiserror::Error;

use crate::returns::ReturnMatrix;

/// Errors produced while aligning price histories
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AlignmentError {
    /// No series were supplied
    #[error("No price series to align")]
    Empty,

    /// The series share no common date
    #[error("Price histories have no overlapping dates")]
    NoOverlap,
}

/// Prices of several tickers on a shared, strictly increasing date index.
///
/// Rows are dates and columns are tickers. Every cell holds a finite, positive
/// price.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceMatrix {
    dates: Vec<NaiveDate>,
    symbols: Vec<String>,
    prices: Array2<f64>,
}

impl PriceMatrix {
    /// Trading dates, ascending
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Tickers, in the order the series were supplied
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Price matrix (dates × tickers)
    pub const fn prices(&self) -> &Array2<f64> {
        &self.prices
    }

    /// Number of aligned dates
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the matrix has no rows
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Simple daily returns `p[t] / p[t-1] - 1`.
    ///
    /// The first date has no predecessor and is dropped, so the result has
    /// one row fewer than the price matrix.
    pub fn returns(&self) -> ReturnMatrix {
        let n_rows = self.len().saturating_sub(1);
        let n_cols = self.symbols.len();
        let mut values = Array2::<f64>::zeros((n_rows, n_cols));

        for t in 0..n_rows {
            for j in 0..n_cols {
                values[[t, j]] = self.prices[[t + 1, j]] / self.prices[[t, j]] - 1.0;
            }
        }

        let dates = self.dates.iter().skip(1).copied().collect();
        ReturnMatrix::new(dates, self.symbols.clone(), values)
    }
}

/// Align `series` on their common trading dates.
///
/// # Errors
/// * [`AlignmentError::Empty`] when `series` is empty
/// * [`AlignmentError::NoOverlap`] when no date survives the intersection
pub fn align_prices(series: &[PriceSeries]) -> Result<PriceMatrix, AlignmentError> {
    if series.is_empty() {
        return Err(AlignmentError::Empty);
    }

    let calendar: Vec<NaiveDate> = series
        .iter()
        .flat_map(|s| s.points().iter().map(|(date, _)| *date))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let filled: Vec<Vec<Option<f64>>> = series.iter().map(|s| forward_fill(s, &calendar)).collect();

    let keep: Vec<usize> = (0..calendar.len())
        .filter(|&row| filled.iter().all(|column| column[row].is_some()))
        .collect();

    if keep.is_empty() {
        return Err(AlignmentError::NoOverlap);
    }

    let mut prices = Array2::<f64>::zeros((keep.len(), series.len()));
    for (i, &row) in keep.iter().enumerate() {
        for (j, column) in filled.iter().enumerate() {
            // Rows in `keep` are fully populated
            prices[[i, j]] = column[row].unwrap_or(f64::NAN);
        }
    }

    Ok(PriceMatrix {
        dates: keep.iter().map(|&row| calendar[row]).collect(),
        symbols: series.iter().map(|s| s.symbol().to_string()).collect(),
        prices,
    })
}

/// Spread `series` over `calendar`, carrying the last price across interior
/// gaps. Dates before the first or after the last observation stay empty.
fn forward_fill(series: &PriceSeries, calendar: &[NaiveDate]) -> Vec<Option<f64>> {
    let points = series.points();
    let Some(((first, _), (last, _))) = points.first().zip(points.last()) else {
        return vec![None; calendar.len()];
    };

    let mut out = Vec::with_capacity(calendar.len());
    let mut cursor = 0;
    let mut current = None;

    for date in calendar {
        while cursor < points.len() && points[cursor].0 <= *date {
            current = Some(points[cursor].1);
            cursor += 1;
        }
        if date < first || date > last {
            out.push(None);
        } else {
            out.push(current);
        }
    }

    out
}
