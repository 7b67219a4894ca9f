//! Daily return series and return matrices

use chrono::NaiveDate;
use hobart_data::PriceSeries;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::stats::pearson;
use crate::weights::PortfolioWeights;

/// Pairwise Pearson correlations keyed by ticker.
pub type CorrelationMatrix = BTreeMap<String, BTreeMap<String, f64>>;

/// A dated sequence of simple daily returns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl ReturnSeries {
    /// Build from parallel date and value vectors.
    ///
    /// Extra entries on the longer side are dropped.
    pub fn new(mut dates: Vec<NaiveDate>, mut values: Vec<f64>) -> Self {
        let n = dates.len().min(values.len());
        dates.truncate(n);
        values.truncate(n);
        Self { dates, values }
    }

    /// Returns of a single price history, one per consecutive pair of prices.
    pub fn from_prices(series: &PriceSeries) -> Self {
        let points = series.points();
        let (dates, values): (Vec<NaiveDate>, Vec<f64>) = points
            .windows(2)
            .map(|w| (w[1].0, w[1].1 / w[0].1 - 1.0))
            .unzip();
        Self { dates, values }
    }

    /// Dates the returns are realized on
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Return values, as fractions
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of returns
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns of `self` and `other` on their common dates, in date order.
    pub fn intersect(&self, other: &Self) -> (Vec<f64>, Vec<f64>) {
        let mut left = Vec::new();
        let mut right = Vec::new();
        let (mut i, mut j) = (0, 0);

        while i < self.len() && j < other.len() {
            match self.dates[i].cmp(&other.dates[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    left.push(self.values[i]);
                    right.push(other.values[j]);
                    i += 1;
                    j += 1;
                }
            }
        }

        (left, right)
    }

    /// Compound `initial` through the returns.
    ///
    /// Element `t` is `initial * prod(1 + r[0..=t])`.
    pub fn compound(&self, initial: f64) -> Vec<f64> {
        self.values
            .iter()
            .scan(initial, |value, r| {
                *value *= 1.0 + r;
                Some(*value)
            })
            .collect()
    }
}

/// Daily returns of several tickers on a shared date index.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnMatrix {
    dates: Vec<NaiveDate>,
    symbols: Vec<String>,
    values: Array2<f64>,
}

impl ReturnMatrix {
    pub(crate) const fn new(dates: Vec<NaiveDate>, symbols: Vec<String>, values: Array2<f64>) -> Self {
        Self {
            dates,
            symbols,
            values,
        }
    }

    /// Dates, ascending
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Tickers, one per column
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Return matrix (dates × tickers)
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of dates
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether there are no dates
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Returns of a single ticker.
    pub fn column(&self, symbol: &str) -> Option<ReturnSeries> {
        let j = self.symbols.iter().position(|s| s == symbol)?;
        Some(ReturnSeries {
            dates: self.dates.clone(),
            values: self.values.column(j).to_vec(),
        })
    }

    /// Per-date arithmetic mean across tickers.
    pub fn equal_weight(&self) -> ReturnSeries {
        let values = self
            .values
            .mean_axis(Axis(1))
            .map(|a| a.to_vec())
            .unwrap_or_default();
        ReturnSeries::new(self.dates.clone(), values)
    }

    /// Per-date weighted sum `sum_i w_i * r_i`.
    ///
    /// Tickers without a weight contribute nothing. Weighted tickers absent
    /// from the matrix are ignored, so the effective exposure may be below one.
    pub fn weighted(&self, weights: &PortfolioWeights) -> ReturnSeries {
        let w: Array1<f64> = self
            .symbols
            .iter()
            .map(|s| weights.get(s).unwrap_or(0.0))
            .collect();
        let values = self.values.dot(&w).to_vec();
        ReturnSeries::new(self.dates.clone(), values)
    }

    /// Pairwise Pearson correlations of the ticker columns.
    ///
    /// The diagonal is `1.0` for any ticker with varying returns and `0.0`
    /// for a ticker whose returns never change.
    pub fn correlation_matrix(&self) -> CorrelationMatrix {
        let columns: Vec<Vec<f64>> = self.values.columns().into_iter().map(|c| c.to_vec()).collect();
        let mut matrix = CorrelationMatrix::new();

        for (i, a) in self.symbols.iter().enumerate() {
            let row = matrix.entry(a.clone()).or_default();
            for (j, b) in self.symbols.iter().enumerate() {
                let rho = if i == j {
                    if pearson(&columns[i], &columns[i]) > 0.0 { 1.0 } else { 0.0 }
                } else {
                    pearson(&columns[i], &columns[j])
                };
                row.insert(b.clone(), rho);
            }
        }

        matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn matrix() -> ReturnMatrix {
        ReturnMatrix::new(
            vec![d(2), d(3), d(4)],
            vec!["A".into(), "B".into()],
            array![[0.01, 0.03], [-0.02, 0.00], [0.04, -0.02]],
        )
    }

    #[test]
    fn test_from_prices() {
        let series = PriceSeries::new("A", vec![(d(1), 100.0), (d(2), 101.0), (d(3), 98.98)]);
        let returns = ReturnSeries::from_prices(&series);

        assert_eq!(returns.dates(), &[d(2), d(3)]);
        assert_relative_eq!(returns.values()[0], 0.01, epsilon = 1e-12);
        assert_relative_eq!(returns.values()[1], -0.02, epsilon = 1e-12);
    }

    #[test]
    fn test_compounding_path() {
        let returns = ReturnSeries::new(vec![d(2), d(3), d(4)], vec![0.01, -0.02, 0.03]);
        let path = returns.compound(100_000.0);

        assert_relative_eq!(path[0], 101_000.0, epsilon = 1e-6);
        assert_relative_eq!(path[1], 98_980.0, epsilon = 1e-6);
        assert_relative_eq!(path[2], 101_949.4, epsilon = 1e-6);
    }

    #[test]
    fn test_equal_weight() {
        let blended = matrix().equal_weight();
        assert_relative_eq!(blended.values()[0], 0.02, epsilon = 1e-12);
        assert_relative_eq!(blended.values()[1], -0.01, epsilon = 1e-12);
        assert_relative_eq!(blended.values()[2], 0.01, epsilon = 1e-12);
    }

    #[test]
    fn test_weighted_ignores_unknown_tickers() {
        let weights = PortfolioWeights::new(vec![("A".into(), 0.75), ("Z".into(), 0.25)]).unwrap();
        let blended = matrix().weighted(&weights);

        assert_relative_eq!(blended.values()[0], 0.0075, epsilon = 1e-12);
        assert_relative_eq!(blended.values()[1], -0.015, epsilon = 1e-12);
    }

    #[test]
    fn test_correlation_matrix_is_symmetric() {
        let corr = matrix().correlation_matrix();

        assert_eq!(corr["A"]["A"], 1.0);
        assert_eq!(corr["B"]["B"], 1.0);
        assert_relative_eq!(corr["A"]["B"], corr["B"]["A"]);
        assert!(corr["A"]["B"].abs() <= 1.0);
    }

    #[test]
    fn test_intersect() {
        let a = ReturnSeries::new(vec![d(2), d(3), d(5)], vec![0.1, 0.2, 0.3]);
        let b = ReturnSeries::new(vec![d(1), d(3), d(4), d(5)], vec![1.0, 2.0, 3.0, 4.0]);

        assert_eq!(a.intersect(&b), (vec![0.2, 0.3], vec![2.0, 4.0]));
    }
}
