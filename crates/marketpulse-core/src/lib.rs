//! # MarketPulse Core
//!
//! Market data acquisition for the MarketPulse watchlist: provider adapters
//! behind one client trait, request throttling, single-flight caching and a
//! persisted listing directory.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Provider adapters (Alpha Vantage, Finnhub, Twelve Data) |
//! | [`cache`] | Expiring cache with single-flight fills |
//! | [`data_source`] | Client trait and structured source errors |
//! | [`directory`] | Listing directory, CSV parsing and autocomplete |
//! | [`domain`] | Domain models (Quote, PricePoint, StockListing) |
//! | [`error`] | Validation and store errors |
//! | [`http_client`] | HTTP client abstraction and fetcher |
//! | [`policy`] | Quota, directory and refresh policies |
//! | [`routing`] | Key discovery and client selection |
//! | [`source`] | Provider identifiers |
//! | [`store`] | JSON file and in-memory persistence |
//! | [`throttling`] | Sliding-window rate limiter |
//! | [`watchlist`] | Persisted watchlist with paced refresh |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use marketpulse_core::{MarketDataClientBuilder, Symbol};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = MarketDataClientBuilder::from_env().build();
//!
//!     let quote = client.fetch_quote(&Symbol::parse("AAPL")?).await?;
//!     println!("AAPL price: ${:.2}", quote.price);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  CLI / User     │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │  HybridClient   │────▶│ Rate Limiter     │
//! │  (routing)      │     │ Expiring Cache   │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Adapters        │────▶│ HTTP Fetcher     │
//! │ (client trait)  │     │ (reqwest)        │
//! └─────────────────┘     └──────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Provider calls return [`SourceError`], classified by kind:
//!
//! ```rust
//! use marketpulse_core::{SourceError, SourceErrorKind};
//!
//! fn handle_error(error: SourceError) {
//!     match error.kind() {
//!         SourceErrorKind::HttpStatus if error.retryable() => {
//!             // Try again later
//!         }
//!         SourceErrorKind::ProviderMessage => {
//!             // Show the provider's explanation
//!         }
//!         SourceErrorKind::MissingApiKey => {
//!             // Ask for configuration
//!         }
//!         _ => {}
//!     }
//! }
//! ```
//!
//! ## Security
//!
//! - API keys are read from environment variables and never logged
//! - Logged URLs have their query string removed

pub mod adapters;
pub mod cache;
pub mod data_source;
pub mod directory;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod policy;
pub mod routing;
pub mod source;
pub mod store;
pub mod throttling;
pub mod watchlist;

// Adapter implementations
pub use adapters::{AlphaVantageAdapter, FinnhubAdapter, TwelveDataAdapter};

// Caching
pub use cache::{CacheError, ExpiringCache};

// Client trait and errors
pub use data_source::{MarketDataClient, SourceError, SourceErrorKind, SourceFuture};

// Listing directory
pub use directory::{
    fallback_listings, search_listings, DirectoryLoad, ListingDirectoryService, ListingFeed,
};

// Domain models
pub use domain::{most_recent, PricePoint, Quote, StockListing, Symbol, SymbolSuggestion, UtcDateTime};

// Error types
pub use error::{StoreError, ValidationError};

// HTTP client types
pub use http_client::{
    decode_json, HttpAuth, HttpClient, HttpError, HttpFetcher, HttpRequest, HttpResponse,
    ReqwestHttpClient,
};

// Policies
pub use policy::{DirectoryPolicy, ProviderPolicy, RefreshPolicy};

// Routing types
pub use routing::{ClientSelection, HybridClient, MarketDataClientBuilder, ProviderKeys};

// Source identifiers
pub use source::ProviderId;

// Persistence
pub use store::{JsonFileStore, ListingStore, MemoryListingStore, MemoryWatchlistStore, WatchlistStore};

// Throttling
pub use throttling::SlidingWindowLimiter;

// Watchlist
pub use watchlist::{AddOutcome, RefreshReport, Ticker, Watchlist, WatchlistError};
