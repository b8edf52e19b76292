use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Canonical provider identifiers used in logs, cache keys and client names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Alphavantage,
    Finnhub,
    Twelvedata,
}

impl ProviderId {
    pub const ALL: [Self; 3] = [Self::Alphavantage, Self::Finnhub, Self::Twelvedata];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Alphavantage => "alphavantage",
            Self::Finnhub => "finnhub",
            Self::Twelvedata => "twelvedata",
        }
    }

    /// Human-readable provider name.
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Alphavantage => "AlphaVantage",
            Self::Finnhub => "Finnhub",
            Self::Twelvedata => "TwelveData",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "alphavantage" | "alpha_vantage" => Ok(Self::Alphavantage),
            "finnhub" => Ok(Self::Finnhub),
            "twelvedata" | "twelve_data" => Ok(Self::Twelvedata),
            other => Err(ValidationError::InvalidProvider {
                value: other.to_owned(),
            }),
        }
    }
}
