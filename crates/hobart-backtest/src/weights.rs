//! Portfolio weights and portfolio allocation files

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Allowed deviation of the weight sum from 1.0 before renormalizing
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.01;

/// Errors for invalid weights or allocation files
#[derive(Debug, Error)]
pub enum WeightError {
    /// No weights were supplied
    #[error("Portfolio has no holdings")]
    Empty,

    /// A weight is negative or not finite
    #[error("Invalid weight {weight} for {symbol}")]
    InvalidWeight {
        /// Ticker carrying the weight
        symbol: String,
        /// Offending value
        weight: f64,
    },

    /// The same ticker appears twice
    #[error("Duplicate holding: {0}")]
    Duplicate(String),

    /// A ticker is blank
    #[error("Holding with an empty ticker")]
    EmptySymbol,

    /// Weights sum to zero
    #[error("Portfolio weights sum to zero")]
    ZeroSum,

    /// The allocation file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The allocation file could not be parsed
    #[error("Failed to parse portfolio file: {0}")]
    Parse(String),
}

/// Mapping from ticker to portfolio fraction, in insertion order.
///
/// Tickers not listed have weight zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "BTreeMap<String, f64>", try_from = "BTreeMap<String, f64>")]
pub struct PortfolioWeights {
    entries: Vec<(String, f64)>,
}

/// Record of a renormalization applied to user-supplied weights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightAdjustment {
    /// Sum of the weights as supplied
    pub original_sum: f64,
    /// Factor every weight was multiplied by
    pub scale: f64,
}

impl PortfolioWeights {
    /// Validate and build weights.
    ///
    /// Symbols are trimmed and upper-cased. Weights must be finite and
    /// non-negative with a positive sum; they need not sum to one.
    pub fn new(entries: impl IntoIterator<Item = (String, f64)>) -> Result<Self, WeightError> {
        let mut out: Vec<(String, f64)> = Vec::new();
        for (symbol, weight) in entries {
            let symbol = symbol.trim().to_uppercase();
            if symbol.is_empty() {
                return Err(WeightError::EmptySymbol);
            }
            if !weight.is_finite() || weight < 0.0 {
                return Err(WeightError::InvalidWeight { symbol, weight });
            }
            if out.iter().any(|(s, _)| *s == symbol) {
                return Err(WeightError::Duplicate(symbol));
            }
            out.push((symbol, weight));
        }

        if out.is_empty() {
            return Err(WeightError::Empty);
        }
        if out.iter().map(|(_, w)| w).sum::<f64>() <= 0.0 {
            return Err(WeightError::ZeroSum);
        }

        Ok(Self { entries: out })
    }

    /// Weight of `symbol`, if listed
    pub fn get(&self, symbol: &str) -> Option<f64> {
        self.entries.iter().find(|(s, _)| s == symbol).map(|(_, w)| *w)
    }

    /// Tickers, in insertion order
    pub fn symbols(&self) -> Vec<String> {
        self.entries.iter().map(|(s, _)| s.clone()).collect()
    }

    /// `(ticker, weight)` pairs, in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(s, w)| (s.as_str(), *w))
    }

    /// Number of holdings
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false for validated weights
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all weights
    pub fn sum(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w).sum()
    }

    /// Rescale to sum to one when the sum is off by more than
    /// [`WEIGHT_SUM_TOLERANCE`]. Weights within tolerance are returned as-is.
    pub fn normalized(&self) -> (Self, Option<WeightAdjustment>) {
        let total = self.sum();
        if (total - 1.0).abs() <= WEIGHT_SUM_TOLERANCE {
            return (self.clone(), None);
        }

        let scale = 1.0 / total;
        let entries = self.entries.iter().map(|(s, w)| (s.clone(), w * scale)).collect();
        (
            Self { entries },
            Some(WeightAdjustment {
                original_sum: total,
                scale,
            }),
        )
    }
}

impl From<PortfolioWeights> for BTreeMap<String, f64> {
    fn from(weights: PortfolioWeights) -> Self {
        weights.entries.into_iter().collect()
    }
}

impl TryFrom<BTreeMap<String, f64>> for PortfolioWeights {
    type Error = WeightError;

    fn try_from(map: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        Self::new(map)
    }
}

/// How weights in an allocation file are expressed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    /// `0.25` means 25%
    #[default]
    Fraction,
    /// `25.0` means 25%
    Percent,
}

impl WeightUnit {
    const fn divisor(self) -> f64 {
        match self {
            Self::Fraction => 1.0,
            Self::Percent => 100.0,
        }
    }
}

/// One position in an allocation file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    /// Ticker symbol
    pub ticker: String,
    /// Weight, in the allocation's unit
    pub weight: f64,
    /// Free-form note, e.g. the rationale for the position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A portfolio allocation as written to disk.
///
/// ```json
/// { "unit": "percent", "holdings": [ { "ticker": "AAPL", "weight": 20 } ] }
/// ```
///
/// The same shape is accepted as TOML with `[[holdings]]` tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioAllocation {
    /// Unit of every `weight` in `holdings`
    #[serde(default)]
    pub unit: WeightUnit,
    /// Positions
    pub holdings: Vec<Holding>,
}

impl PortfolioAllocation {
    /// Parse a JSON allocation.
    pub fn from_json(input: &str) -> Result<Self, WeightError> {
        serde_json::from_str(input).map_err(|e| WeightError::Parse(e.to_string()))
    }

    /// Parse a TOML allocation.
    pub fn from_toml(input: &str) -> Result<Self, WeightError> {
        toml::from_str(input).map_err(|e| WeightError::Parse(e.to_string()))
    }

    /// Load an allocation file; `.toml` files are read as TOML, anything
    /// else as JSON.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, WeightError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml(&content),
            _ => Self::from_json(&content),
        }
    }

    /// Convert to fractional weights.
    pub fn weights(&self) -> Result<PortfolioWeights, WeightError> {
        let divisor = self.unit.divisor();
        PortfolioWeights::new(self.holdings.iter().map(|h| (h.ticker.clone(), h.weight / divisor)))
    }
}
