//! Persistence boundary for the listing directory and the watchlist.
//!
//! The JSON file stores keep one document per concern under a data
//! directory and replace files atomically (write to a sibling temp file,
//! then rename).

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;
use crate::watchlist::Ticker;
use crate::{StockListing, UtcDateTime};

pub const LISTINGS_FILE: &str = "listing_status_active_v2.json";
pub const LISTINGS_UPDATED_AT_FILE: &str = "listing_status_active_v2.updated_at";
pub const WATCHLIST_FILE: &str = "watchlist_v1.json";

/// Snapshot storage for the listing directory.
pub trait ListingStore: Send + Sync {
    /// `Ok(None)` when no snapshot was ever saved.
    fn load(&self) -> Result<Option<Vec<StockListing>>, StoreError>;

    fn save(&self, listings: &[StockListing], updated_at: UtcDateTime) -> Result<(), StoreError>;

    fn last_update(&self) -> Result<Option<UtcDateTime>, StoreError>;
}

/// Storage for the ordered watchlist.
pub trait WatchlistStore: Send + Sync {
    /// Empty when nothing was saved yet.
    fn load(&self) -> Result<Vec<Ticker>, StoreError>;

    fn save(&self, tickers: &[Ticker]) -> Result<(), StoreError>;
}

/// JSON documents under one data directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    fn read_json<T: DeserializeOwned>(&self, file: &str) -> Result<Option<T>, StoreError> {
        let path = self.path(file);
        let Some(bytes) = read_optional(&path)? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn write_json<T: Serialize + ?Sized>(&self, file: &str, value: &T) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_atomic(file, &bytes)
    }

    fn write_atomic(&self, file: &str, bytes: &[u8]) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        let target = self.path(file);
        let staging = self.path(&format!("{file}.tmp"));
        fs::write(&staging, bytes).map_err(|e| StoreError::io(&staging, e))?;
        fs::rename(&staging, &target).map_err(|e| StoreError::io(&target, e))
    }
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, StoreError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
        Err(error) => Err(StoreError::io(path, error)),
    }
}

impl ListingStore for JsonFileStore {
    fn load(&self) -> Result<Option<Vec<StockListing>>, StoreError> {
        self.read_json(LISTINGS_FILE)
    }

    fn save(&self, listings: &[StockListing], updated_at: UtcDateTime) -> Result<(), StoreError> {
        self.write_json(LISTINGS_FILE, listings)?;
        self.write_atomic(LISTINGS_UPDATED_AT_FILE, updated_at.format_rfc3339().as_bytes())
    }

    fn last_update(&self) -> Result<Option<UtcDateTime>, StoreError> {
        let path = self.path(LISTINGS_UPDATED_AT_FILE);
        let Some(bytes) = read_optional(&path)? else {
            return Ok(None);
        };
        let text = String::from_utf8_lossy(&bytes);
        Ok(Some(UtcDateTime::parse(text.trim())?))
    }
}

impl WatchlistStore for JsonFileStore {
    fn load(&self) -> Result<Vec<Ticker>, StoreError> {
        Ok(self.read_json(WATCHLIST_FILE)?.unwrap_or_default())
    }

    fn save(&self, tickers: &[Ticker]) -> Result<(), StoreError> {
        self.write_json(WATCHLIST_FILE, tickers)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        warn!("in-memory store was poisoned, recovering");
        poisoned.into_inner()
    })
}

/// Process-local listing store.
#[derive(Debug, Default)]
pub struct MemoryListingStore {
    snapshot: Mutex<Option<(Vec<StockListing>, UtcDateTime)>>,
}

impl MemoryListingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(listings: Vec<StockListing>, updated_at: UtcDateTime) -> Self {
        Self {
            snapshot: Mutex::new(Some((listings, updated_at))),
        }
    }
}

impl ListingStore for MemoryListingStore {
    fn load(&self) -> Result<Option<Vec<StockListing>>, StoreError> {
        Ok(lock(&self.snapshot)
            .as_ref()
            .map(|(listings, _)| listings.clone()))
    }

    fn save(&self, listings: &[StockListing], updated_at: UtcDateTime) -> Result<(), StoreError> {
        *lock(&self.snapshot) = Some((listings.to_vec(), updated_at));
        Ok(())
    }

    fn last_update(&self) -> Result<Option<UtcDateTime>, StoreError> {
        Ok(lock(&self.snapshot).as_ref().map(|(_, updated_at)| *updated_at))
    }
}

/// Process-local watchlist store.
#[derive(Debug, Default)]
pub struct MemoryWatchlistStore {
    tickers: Mutex<Vec<Ticker>>,
}

impl MemoryWatchlistStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WatchlistStore for MemoryWatchlistStore {
    fn load(&self) -> Result<Vec<Ticker>, StoreError> {
        Ok(lock(&self.tickers).clone())
    }

    fn save(&self, tickers: &[Ticker]) -> Result<(), StoreError> {
        *lock(&self.tickers) = tickers.to_vec();
        Ok(())
    }
}
