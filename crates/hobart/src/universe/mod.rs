//! Stock universes.
//!
//! A universe is the pool of tickers a portfolio is drawn from. The default
//! universe is a set of large-cap US equities spread across GICS sectors.

pub mod gics;

pub use gics::{GicsSector, ParseSectorError};

use std::collections::BTreeMap;

/// Trait for stock universes.
pub trait Universe {
    /// All symbols in the universe.
    fn symbols(&self) -> Vec<String>;

    /// Whether `symbol` is in the universe.
    fn contains(&self, symbol: &str) -> bool {
        self.symbols().iter().any(|s| s == symbol)
    }

    /// Number of constituents.
    fn size(&self) -> usize {
        self.symbols().len()
    }
}

/// A universe member with its sector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constituent {
    /// Ticker symbol.
    pub symbol: &'static str,
    /// GICS sector.
    pub sector: GicsSector,
}

const fn member(symbol: &'static str, sector: GicsSector) -> Constituent {
    Constituent { symbol, sector }
}

const DEFAULT_CONSTITUENTS: [Constituent; 28] = {
    use GicsSector::*;
    [
        member("AAPL", InformationTechnology),
        member("MSFT", InformationTechnology),
        member("NVDA", InformationTechnology),
        member("ADBE", InformationTechnology),
        member("GOOGL", CommunicationServices),
        member("META", CommunicationServices),
        member("DIS", CommunicationServices),
        member("NFLX", CommunicationServices),
        member("CMCSA", CommunicationServices),
        member("JPM", Financials),
        member("BAC", Financials),
        member("V", Financials),
        member("MA", Financials),
        member("GS", Financials),
        member("JNJ", HealthCare),
        member("UNH", HealthCare),
        member("PFE", HealthCare),
        member("ABBV", HealthCare),
        member("TMO", HealthCare),
        member("AMZN", ConsumerDiscretionary),
        member("TSLA", ConsumerDiscretionary),
        member("HD", ConsumerDiscretionary),
        member("NKE", ConsumerDiscretionary),
        member("WMT", ConsumerStaples),
        member("PG", ConsumerStaples),
        member("XOM", Energy),
        member("CVX", Energy),
        member("COP", Energy),
    ]
};

/// The built-in universe of 28 large-cap US equities.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultUniverse;

impl DefaultUniverse {
    /// Create the default universe.
    pub const fn new() -> Self {
        Self
    }

    /// All constituents, grouped by sector.
    pub const fn constituents(&self) -> &'static [Constituent] {
        &DEFAULT_CONSTITUENTS
    }

    /// Sector of `symbol`, if it is a member.
    pub fn sector(&self, symbol: &str) -> Option<GicsSector> {
        DEFAULT_CONSTITUENTS
            .iter()
            .find(|c| c.symbol == symbol)
            .map(|c| c.sector)
    }

    /// Members of one sector.
    pub fn symbols_in_sector(&self, sector: GicsSector) -> Vec<String> {
        DEFAULT_CONSTITUENTS
            .iter()
            .filter(|c| c.sector == sector)
            .map(|c| c.symbol.to_string())
            .collect()
    }

    /// Members keyed by sector, sectors in code order.
    pub fn by_sector(&self) -> BTreeMap<GicsSector, Vec<String>> {
        let mut groups: BTreeMap<GicsSector, Vec<String>> = BTreeMap::new();
        for c in &DEFAULT_CONSTITUENTS {
            groups.entry(c.sector).or_default().push(c.symbol.to_string());
        }
        groups
    }
}

impl Universe for DefaultUniverse {
    fn symbols(&self) -> Vec<String> {
        DEFAULT_CONSTITUENTS.iter().map(|c| c.symbol.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_universe_trait() {
        let universe = DefaultUniverse::new();

        assert!(universe.contains("AAPL"));
        assert!(!universe.contains("NOTREAL"));
        assert_eq!(universe.size(), 28);
    }

    #[test]
    fn test_no_duplicates() {
        let mut symbols = DefaultUniverse::new().symbols();
        symbols.sort();
        symbols.dedup();
        assert_eq!(symbols.len(), 28);
    }

    #[test]
    fn test_sectors() {
        let universe = DefaultUniverse::new();

        assert_eq!(universe.sector("XOM"), Some(GicsSector::Energy));
        assert_eq!(universe.sector("NOTREAL"), None);
        assert_eq!(universe.symbols_in_sector(GicsSector::Energy), vec!["XOM", "CVX", "COP"]);
        assert!(universe.symbols_in_sector(GicsSector::Utilities).is_empty());

        let groups = universe.by_sector();
        assert_eq!(groups.values().map(Vec::len).sum::<usize>(), 28);
        assert_eq!(groups.keys().next(), Some(&GicsSector::Energy));
    }
}
