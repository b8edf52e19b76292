//! # Listing Directory
//!
//! Keeps a local snapshot of every actively traded symbol for offline
//! autocomplete.
//!
//! | Item | Description |
//! |------|-------------|
//! | [`ListingDirectoryService`] | Snapshot-first loader with network refresh |
//! | [`ListingFeed`] | Source of the raw listing CSV |
//! | [`search_listings`] | Prefix-then-name autocomplete |
//! | [`fallback_listings`] | Built-in popular symbols |
//!
//! A refresh never replaces a usable snapshot with a worse one: payloads that
//! are not CSV, or that parse to suspiciously few rows, are rejected and the
//! previous snapshot is served instead.

mod listing_csv;
mod search;

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use serde_json::Value;

pub use listing_csv::{has_listing_header, parse_listings, split_line};
pub use search::{fallback_listings, search_listings};

use crate::adapters::diagnostic_field;
use crate::data_source::{SourceError, SourceFuture};
use crate::policy::DirectoryPolicy;
use crate::store::ListingStore;
use crate::{StockListing, UtcDateTime};

/// Fields carrying the provider's explanation when JSON arrives instead of CSV.
const ENVELOPE_FIELDS: &[&str] = &["Information", "Note", "Error Message", "message"];

/// Source of the raw `LISTING_STATUS` CSV document.
pub trait ListingFeed: Send + Sync {
    fn fetch_listing_csv(&self) -> SourceFuture<'_, String>;
}

/// Result of [`ListingDirectoryService::load_or_fallback`].
#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryLoad {
    pub listings: Vec<StockListing>,
    /// Set when the built-in list is served instead of the directory.
    pub notice: Option<String>,
}

impl DirectoryLoad {
    pub fn is_fallback(&self) -> bool {
        self.notice.is_some()
    }
}

/// Snapshot-first loader for the listing directory.
#[derive(Clone)]
pub struct ListingDirectoryService {
    feed: Arc<dyn ListingFeed>,
    store: Arc<dyn ListingStore>,
    policy: DirectoryPolicy,
}

impl ListingDirectoryService {
    pub fn new(feed: Arc<dyn ListingFeed>, store: Arc<dyn ListingStore>) -> Self {
        Self::with_policy(feed, store, DirectoryPolicy::default())
    }

    pub fn with_policy(
        feed: Arc<dyn ListingFeed>,
        store: Arc<dyn ListingStore>,
        policy: DirectoryPolicy,
    ) -> Self {
        Self {
            feed,
            store,
            policy,
        }
    }

    pub fn policy(&self) -> &DirectoryPolicy {
        &self.policy
    }

    /// Returns the snapshot when younger than `max_age`, otherwise refreshes.
    ///
    /// # Errors
    ///
    /// The refresh error, only when no non-empty snapshot exists to fall back on.
    pub async fn load_listings(&self, max_age: Duration) -> Result<Vec<StockListing>, SourceError> {
        let snapshot = self.read_snapshot();
        let last_update = self.read_last_update();

        if let (Some(listings), Some(updated_at)) = (&snapshot, last_update) {
            if UtcDateTime::now().since(updated_at) < max_age {
                return Ok(listings.clone());
            }
        }

        match self.refresh().await {
            Ok(listings) => Ok(listings),
            Err(error) => match snapshot {
                Some(listings) => {
                    warn!(
                        "listing refresh failed, serving {} cached rows: {error}",
                        listings.len()
                    );
                    Ok(listings)
                }
                None => Err(error),
            },
        }
    }

    /// Like [`load_listings`](Self::load_listings), but never fails: the
    /// built-in list is returned with a notice when nothing usable loads.
    pub async fn load_or_fallback(&self, max_age: Duration) -> DirectoryLoad {
        match self.load_listings(max_age).await {
            Ok(listings) if !listings.is_empty() => DirectoryLoad {
                listings,
                notice: None,
            },
            Ok(_) => DirectoryLoad {
                listings: fallback_listings(),
                notice: Some(String::from(
                    "listing directory is empty, using built-in popular symbols",
                )),
            },
            Err(error) => {
                warn!("listing directory unavailable, using built-in list: {error}");
                DirectoryLoad {
                    listings: fallback_listings(),
                    notice: Some(format!("{error}; using built-in popular symbols")),
                }
            }
        }
    }

    async fn refresh(&self) -> Result<Vec<StockListing>, SourceError> {
        let raw = self.feed.fetch_listing_csv().await?;
        let payload = raw.replace('\u{feff}', "");
        let payload = payload.trim();

        if payload.starts_with('{') {
            return Err(envelope_error(payload));
        }
        if !has_listing_header(payload) {
            return Err(SourceError::decode(
                "listing feed returned a payload that is not CSV",
            ));
        }

        let listings = parse_listings(payload);
        if listings.len() <= self.policy.row_floor {
            return Err(SourceError::no_data(format!(
                "listing feed parsed too few rows: {} (need more than {})",
                listings.len(),
                self.policy.row_floor
            )));
        }

        info!("listing directory refreshed with {} rows", listings.len());
        if let Err(error) = self.store.save(&listings, UtcDateTime::now()) {
            warn!("failed to persist listing snapshot: {error}");
        }
        Ok(listings)
    }

    fn read_snapshot(&self) -> Option<Vec<StockListing>> {
        match self.store.load() {
            Ok(snapshot) => snapshot.filter(|listings| !listings.is_empty()),
            Err(error) => {
                warn!("failed to read listing snapshot: {error}");
                None
            }
        }
    }

    fn read_last_update(&self) -> Option<UtcDateTime> {
        self.store.last_update().unwrap_or_else(|error| {
            warn!("failed to read listing snapshot timestamp: {error}");
            None
        })
    }
}

fn envelope_error(payload: &str) -> SourceError {
    let message = serde_json::from_str::<Value>(payload)
        .ok()
        .and_then(|document| diagnostic_field(&document, ENVELOPE_FIELDS));

    match message {
        Some(message) => SourceError::provider_message(message),
        None => SourceError::decode("listing feed returned JSON instead of CSV"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryListingStore;
    use crate::SourceErrorKind;

    struct StaticFeed(Result<String, SourceError>);

    impl ListingFeed for StaticFeed {
        fn fetch_listing_csv(&self) -> SourceFuture<'_, String> {
            let outcome = self.0.clone();
            Box::pin(async move { outcome })
        }
    }

    fn csv_with_rows(rows: usize) -> String {
        let mut csv = String::from("\u{feff}symbol,name,exchange,assetType,ipoDate,delistingDate,status\n");
        for index in 0..rows {
            csv.push_str(&format!("sym{index},Company {index},NYSE,Stock,2001-01-01,null,Active\n"));
        }
        csv
    }

    fn service(feed: Result<String, SourceError>) -> (Arc<MemoryListingStore>, ListingDirectoryService) {
        let store = Arc::new(MemoryListingStore::new());
        let service = ListingDirectoryService::new(Arc::new(StaticFeed(feed)), store.clone());
        (store, service)
    }

    #[tokio::test]
    async fn refresh_persists_and_uppercases() {
        let (store, service) = service(Ok(csv_with_rows(101)));

        let listings = service
            .load_listings(Duration::from_secs(3_600))
            .await
            .expect("listings");
        assert_eq!(listings.len(), 101);
        assert_eq!(listings[0].symbol, "SYM0");
        assert!(store.last_update().expect("timestamp").is_some());
    }

    #[tokio::test]
    async fn envelope_payload_is_provider_message() {
        let (_, service) = service(Ok(String::from(
            r#"  {"Information": "Thank you for using Alpha Vantage!"} "#,
        )));

        let error = service
            .load_listings(Duration::from_secs(60))
            .await
            .expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::ProviderMessage);
        assert_eq!(error.message(), "Thank you for using Alpha Vantage!");
    }

    #[tokio::test]
    async fn row_floor_is_inclusive() {
        let (_, service) = service(Ok(csv_with_rows(100)));

        let error = service
            .load_listings(Duration::from_secs(60))
            .await
            .expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::NoData);
    }

    #[tokio::test]
    async fn fallback_carries_notice() {
        let (_, service) = service(Err(SourceError::transport("offline")));

        let loaded = service.load_or_fallback(Duration::from_secs(60)).await;
        assert!(loaded.is_fallback());
        assert_eq!(loaded.listings.len(), 17);
        assert!(loaded.notice.as_deref().unwrap_or_default().contains("offline"));
    }
}
