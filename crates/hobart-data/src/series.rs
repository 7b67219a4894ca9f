//! Close-price series extracted from quote frames.

use crate::error::{DataError, Result};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Days between 0001-01-01 (CE day 1) and the Unix epoch.
const UNIX_EPOCH_CE_DAYS: i32 = 719_163;

/// Which price column of a quote frame drives returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceField {
    /// Raw close.
    Close,
    /// Split and dividend adjusted close.
    #[default]
    AdjustedClose,
}

impl PriceField {
    /// Column name in a quote frame.
    pub const fn column(&self) -> &'static str {
        match self {
            Self::Close => "close",
            Self::AdjustedClose => "adjusted_close",
        }
    }
}

/// Daily close prices for one ticker.
///
/// Points are strictly increasing by date with no duplicates, and every
/// price is finite and positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    points: Vec<(NaiveDate, f64)>,
}

impl PriceSeries {
    /// Build a series from possibly unordered observations.
    ///
    /// Points are sorted by date. When a date repeats, the last observation
    /// wins. Non-finite and non-positive prices are discarded.
    pub fn new(symbol: impl Into<String>, points: impl IntoIterator<Item = (NaiveDate, f64)>) -> Self {
        let mut points: Vec<(NaiveDate, f64)> = points
            .into_iter()
            .filter(|(_, price)| price.is_finite() && *price > 0.0)
            .collect();
        // stable sort keeps input order within a date, so the last one survives dedup
        points.sort_by_key(|(date, _)| *date);
        let mut deduped: Vec<(NaiveDate, f64)> = Vec::with_capacity(points.len());
        for (date, price) in points {
            match deduped.last_mut() {
                Some(last) if last.0 == date => last.1 = price,
                _ => deduped.push((date, price)),
            }
        }

        Self {
            symbol: symbol.into(),
            points: deduped,
        }
    }

    /// Extract a price series from a quote frame.
    ///
    /// The frame needs a `date` column (Date or `YYYY-MM-DD` strings) and the
    /// column named by `field`. Rows with a null date or price are skipped.
    pub fn from_quotes(symbol: &str, df: &DataFrame, field: PriceField) -> Result<Self> {
        let dates = frame_dates(df)?;
        let prices = df.column(field.column())?.cast(&DataType::Float64)?;
        let prices = prices.f64()?;

        let points = dates
            .into_iter()
            .zip(prices.into_iter())
            .filter_map(|(date, price)| Some((date?, price?)));

        Ok(Self::new(symbol, points))
    }

    /// Ticker symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Observations in date order.
    pub fn points(&self) -> &[(NaiveDate, f64)] {
        &self.points
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series has no observations.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

}

/// Read the `date` column of a quote frame.
pub(crate) fn frame_dates(df: &DataFrame) -> Result<Vec<Option<NaiveDate>>> {
    let column = df.column("date")?;

    if column.dtype() == &DataType::String {
        return column
            .str()?
            .into_iter()
            .map(|value| {
                value
                    .map(|s| {
                        NaiveDate::parse_from_str(s, "%Y-%m-%d")
                            .map_err(|e| DataError::Parse(format!("Invalid date {s}: {e}")))
                    })
                    .transpose()
            })
            .collect();
    }

    let days = column.cast(&DataType::Int32)?;
    let dates = days
        .i32()?
        .into_iter()
        .map(|d| d.and_then(|d| NaiveDate::from_num_days_from_ce_opt(d + UNIX_EPOCH_CE_DAYS)))
        .collect();
    Ok(dates)
}

/// Build a quote frame holding a single price path.
///
/// All price columns carry the same value and volume is zero. Used by
/// in-memory sources and tests where only closes matter.
pub fn quotes_frame(symbol: &str, points: &[(NaiveDate, f64)]) -> Result<DataFrame> {
    let dates: Vec<NaiveDate> = points.iter().map(|(date, _)| *date).collect();
    let prices: Vec<f64> = points.iter().map(|(_, price)| *price).collect();
    let volumes: Vec<u64> = vec![0; points.len()];
    let date_col = date_column(&dates)?;

    let df = DataFrame::new(vec![
        Series::new("symbol".into(), vec![symbol; points.len()]).into(),
        date_col,
        Series::new("open".into(), prices.clone()).into(),
        Series::new("high".into(), prices.clone()).into(),
        Series::new("low".into(), prices.clone()).into(),
        Series::new("close".into(), prices.clone()).into(),
        Series::new("volume".into(), volumes).into(),
        Series::new("adjusted_close".into(), prices).into(),
    ])?;

    Ok(df)
}

/// A polars `Date` column named `date`.
pub(crate) fn date_column(dates: &[NaiveDate]) -> Result<Column> {
    let days: Vec<i32> = dates
        .iter()
        .map(|date| date.num_days_from_ce() - UNIX_EPOCH_CE_DAYS)
        .collect();
    Ok(Series::new("date".into(), days).cast(&DataType::Date)?.into())
}
