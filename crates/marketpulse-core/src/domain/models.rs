use serde::{Deserialize, Serialize};

use crate::{UtcDateTime, ValidationError};

/// Latest price for an instrument with the provider's daily change, when reported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub price: f64,
    pub change_percent: Option<f64>,
}

impl Quote {
    pub fn new(price: f64, change_percent: Option<f64>) -> Result<Self, ValidationError> {
        validate_non_negative("price", price)?;
        validate_optional_finite("change_percent", change_percent)?;

        Ok(Self {
            price,
            change_percent,
        })
    }
}

/// Daily close for one session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub ts: UtcDateTime,
    pub close: f64,
}

impl PricePoint {
    pub fn new(ts: UtcDateTime, close: f64) -> Result<Self, ValidationError> {
        validate_non_negative("close", close)?;
        Ok(Self { ts, close })
    }
}

/// Sorts points ascending by timestamp and keeps the most recent `limit` of them.
pub fn most_recent(mut points: Vec<PricePoint>, limit: usize) -> Vec<PricePoint> {
    points.sort_by_key(|point| point.ts);
    let skip = points.len().saturating_sub(limit);
    points.drain(..skip);
    points
}

/// One row of the tradable-symbol directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockListing {
    pub symbol: String,
    pub name: String,
    pub exchange: String,
    pub asset_type: String,
    pub status: String,
}

impl StockListing {
    /// Identity key. The same symbol may be listed on several exchanges or as several asset types.
    pub fn id(&self) -> String {
        format!("{}|{}|{}", self.symbol, self.exchange, self.asset_type)
    }
}

/// Provider search hit used for symbol lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolSuggestion {
    pub symbol: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub region: Option<String>,
    pub currency: Option<String>,
    pub match_score: Option<f64>,
}

impl SymbolSuggestion {
    pub fn id(&self) -> String {
        format!("{}|{}", self.symbol, self.region.as_deref().unwrap_or_default())
    }
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}

fn validate_optional_finite(
    field: &'static str,
    value: Option<f64>,
) -> Result<(), ValidationError> {
    if let Some(value) = value {
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteValue { field });
        }
    }
    Ok(())
}
