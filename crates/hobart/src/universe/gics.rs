//! GICS (Global Industry Classification Standard) sectors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Unknown sector name or code.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown GICS sector: {0}")]
pub struct ParseSectorError(pub String);

/// GICS Level 1 sectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GicsSector {
    /// Energy (10)
    Energy,
    /// Materials (15)
    Materials,
    /// Industrials (20)
    Industrials,
    /// Consumer Discretionary (25)
    ConsumerDiscretionary,
    /// Consumer Staples (30)
    ConsumerStaples,
    /// Health Care (35)
    HealthCare,
    /// Financials (40)
    Financials,
    /// Information Technology (45)
    InformationTechnology,
    /// Communication Services (50)
    CommunicationServices,
    /// Utilities (55)
    Utilities,
    /// Real Estate (60)
    RealEstate,
}

impl GicsSector {
    /// All sectors in code order.
    pub const ALL: [Self; 11] = [
        Self::Energy,
        Self::Materials,
        Self::Industrials,
        Self::ConsumerDiscretionary,
        Self::ConsumerStaples,
        Self::HealthCare,
        Self::Financials,
        Self::InformationTechnology,
        Self::CommunicationServices,
        Self::Utilities,
        Self::RealEstate,
    ];

    /// Two-digit sector code.
    pub const fn code(&self) -> u8 {
        match self {
            Self::Energy => 10,
            Self::Materials => 15,
            Self::Industrials => 20,
            Self::ConsumerDiscretionary => 25,
            Self::ConsumerStaples => 30,
            Self::HealthCare => 35,
            Self::Financials => 40,
            Self::InformationTechnology => 45,
            Self::CommunicationServices => 50,
            Self::Utilities => 55,
            Self::RealEstate => 60,
        }
    }

    /// Full sector name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Energy => "Energy",
            Self::Materials => "Materials",
            Self::Industrials => "Industrials",
            Self::ConsumerDiscretionary => "Consumer Discretionary",
            Self::ConsumerStaples => "Consumer Staples",
            Self::HealthCare => "Health Care",
            Self::Financials => "Financials",
            Self::InformationTechnology => "Information Technology",
            Self::CommunicationServices => "Communication Services",
            Self::Utilities => "Utilities",
            Self::RealEstate => "Real Estate",
        }
    }

    /// Sector for a two-digit code.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }
}

impl fmt::Display for GicsSector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GicsSector {
    type Err = ParseSectorError;

    /// Accepts the full name, the code, or a common short name, ignoring case,
    /// spaces, dashes and underscores (`"tech"`, `"health-care"`, `"45"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(sector) = s.trim().parse::<u8>().ok().and_then(Self::from_code) {
            return Ok(sector);
        }

        let key: String = s
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();

        let sector = match key.as_str() {
            "energy" => Self::Energy,
            "materials" => Self::Materials,
            "industrials" => Self::Industrials,
            "consumerdiscretionary" | "discretionary" => Self::ConsumerDiscretionary,
            "consumerstaples" | "staples" => Self::ConsumerStaples,
            "healthcare" | "health" => Self::HealthCare,
            "financials" | "financial" => Self::Financials,
            "informationtechnology" | "technology" | "tech" | "it" => Self::InformationTechnology,
            "communicationservices" | "communication" | "communications" => Self::CommunicationServices,
            "utilities" => Self::Utilities,
            "realestate" => Self::RealEstate,
            _ => return Err(ParseSectorError(s.to_string())),
        };
        Ok(sector)
    }
}
