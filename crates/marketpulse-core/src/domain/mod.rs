//! # Domain Models
//!
//! Canonical domain types for marketpulse market data.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Quote`] | Latest price with optional daily change percent |
//! | [`PricePoint`] | Daily close with timestamp |
//! | [`StockListing`] | Directory row used for autocomplete |
//! | [`SymbolSuggestion`] | Provider search hit |
//! | [`Symbol`] | Validated ticker symbol |
//! | [`UtcDateTime`] | UTC timestamp |
//!
//! Constructors validate numeric invariants (finite, non-negative prices):
//!
//! ```rust
//! use marketpulse_core::{Quote, ValidationError};
//!
//! assert!(Quote::new(187.44, Some(-1.165)).is_ok());
//! assert!(matches!(
//!     Quote::new(f64::NAN, None),
//!     Err(ValidationError::NonFiniteValue { .. })
//! ));
//! ```

mod models;
mod symbol;
mod timestamp;

pub use models::{most_recent, PricePoint, Quote, StockListing, SymbolSuggestion};
pub use symbol::Symbol;
pub use timestamp::UtcDateTime;
