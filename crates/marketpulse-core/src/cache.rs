//! Time-bounded in-memory cache with per-key single-flight fills.
//!
//! Concurrent [`ExpiringCache::get_or_create`] calls for the same key share
//! one execution of the fill operation. The fill runs on its own task, so a
//! caller that is cancelled while waiting never cancels the shared work.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use log::warn;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;

/// Failure of the cache machinery itself, as opposed to the fill operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("cache fill for `{key}` ended without producing a result")]
    Abandoned { key: String },
}

type Outcome<V, E> = Option<Result<V, E>>;

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

struct CacheState<V, E> {
    entries: HashMap<String, Entry<V>>,
    in_flight: HashMap<String, watch::Receiver<Outcome<V, E>>>,
}

type SharedState<V, E> = Arc<Mutex<CacheState<V, E>>>;

fn lock<V, E>(state: &SharedState<V, E>) -> MutexGuard<'_, CacheState<V, E>> {
    state.lock().unwrap_or_else(|poisoned| {
        warn!("cache state was poisoned, recovering");
        poisoned.into_inner()
    })
}

/// Key/value cache whose entries expire `ttl` after insertion.
pub struct ExpiringCache<V, E> {
    ttl: Duration,
    state: SharedState<V, E>,
}

impl<V, E> ExpiringCache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + From<CacheError> + 'static,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            state: Arc::new(Mutex::new(CacheState {
                entries: HashMap::new(),
                in_flight: HashMap::new(),
            })),
        }
    }

    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the value when `now < expires_at`; an expired entry is evicted.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut state = lock(&self.state);
        fresh_value(&mut state, key, Instant::now())
    }

    pub fn set(&self, key: impl Into<String>, value: V) {
        let expires_at = Instant::now() + self.ttl;
        lock(&self.state)
            .entries
            .insert(key.into(), Entry { value, expires_at });
    }

    /// Returns the cached value, joins an in-flight fill, or starts a new one.
    ///
    /// Only successful outcomes are cached. Every caller that joined a fill
    /// observes the same value or error.
    ///
    /// # Errors
    ///
    /// The fill's error, or [`CacheError::Abandoned`] converted into `E` when
    /// the fill task terminated without an outcome.
    pub async fn get_or_create<F, Fut>(&self, key: &str, operation: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let mut receiver = {
            let mut state = lock(&self.state);
            if let Some(value) = fresh_value(&mut state, key, Instant::now()) {
                return Ok(value);
            }

            let joined = state.in_flight.get(key).cloned();
            match joined {
                Some(receiver) => receiver,
                None => {
                    let (sender, receiver) = watch::channel(None);
                    state.in_flight.insert(key.to_owned(), receiver.clone());
                    drop(state);

                    let pending = PendingFill {
                        state: Arc::clone(&self.state),
                        key: key.to_owned(),
                        ttl: self.ttl,
                        sender: Some(sender),
                    };
                    let fill = operation();
                    tokio::spawn(async move {
                        let outcome = fill.await;
                        pending.complete(outcome);
                    });
                    receiver
                }
            }
        };

        let outcome = match receiver.wait_for(Option::is_some).await {
            Ok(published) => published.as_ref().cloned(),
            Err(_) => None,
        };
        outcome.unwrap_or_else(|| {
            Err(E::from(CacheError::Abandoned {
                key: key.to_owned(),
            }))
        })
    }

    /// Stored entries, expired ones included until they are read or purged.
    pub fn len(&self) -> usize {
        lock(&self.state).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        lock(&self.state).entries.clear();
    }

    /// Removes every expired entry and returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut state = lock(&self.state);
        let before = state.entries.len();
        state.entries.retain(|_, entry| now < entry.expires_at);
        before - state.entries.len()
    }
}

impl<V, E> std::fmt::Debug for ExpiringCache<V, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpiringCache")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

fn fresh_value<V: Clone, E>(state: &mut CacheState<V, E>, key: &str, now: Instant) -> Option<V> {
    match state.entries.get(key) {
        Some(entry) if now < entry.expires_at => Some(entry.value.clone()),
        Some(_) => {
            state.entries.remove(key);
            None
        }
        None => None,
    }
}

/// Owns the publishing side of one fill. Dropping it without completing
/// (the fill panicked) clears the in-flight marker and closes the channel.
struct PendingFill<V, E> {
    state: SharedState<V, E>,
    key: String,
    ttl: Duration,
    sender: Option<watch::Sender<Outcome<V, E>>>,
}

impl<V: Clone, E> PendingFill<V, E> {
    fn complete(mut self, outcome: Result<V, E>) {
        let Some(sender) = self.sender.take() else {
            return;
        };
        {
            let mut state = lock(&self.state);
            if let Ok(value) = &outcome {
                let expires_at = Instant::now() + self.ttl;
                state.entries.insert(
                    self.key.clone(),
                    Entry {
                        value: value.clone(),
                        expires_at,
                    },
                );
            }
            state.in_flight.remove(&self.key);
        }
        sender.send_replace(Some(outcome));
    }
}

impl<V, E> Drop for PendingFill<V, E> {
    fn drop(&mut self) {
        if let Some(sender) = self.sender.take() {
            warn!("cache fill for `{}` was abandoned", self.key);
            lock(&self.state).in_flight.remove(&self.key);
            drop(sender);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum TestError {
        Failed(&'static str),
        Cache(CacheError),
    }

    impl From<CacheError> for TestError {
        fn from(error: CacheError) -> Self {
            Self::Cache(error)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_at_ttl() {
        let cache: ExpiringCache<String, TestError> = ExpiringCache::new(Duration::from_secs(60));
        cache.set("key1", String::from("value1"));

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(cache.get("key1").as_deref(), Some("value1"));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get("key1").is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn purge_expired_drops_only_stale_entries() {
        let cache: ExpiringCache<u32, TestError> = ExpiringCache::new(Duration::from_secs(10));
        cache.set("old", 1);
        tokio::time::advance(Duration::from_secs(6)).await;
        cache.set("new", 2);
        tokio::time::advance(Duration::from_secs(5)).await;

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("new"), Some(2));

        cache.clear();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn successful_fill_is_cached() {
        let cache: ExpiringCache<u32, TestError> = ExpiringCache::new(Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = Arc::clone(&calls);
            let value = cache
                .get_or_create("answer", move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, TestError>(42)
                })
                .await;
            assert_eq!(value, Ok(42));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_fill_is_not_cached() {
        let cache: ExpiringCache<u32, TestError> = ExpiringCache::new(Duration::from_secs(60));

        let first = cache
            .get_or_create("key", || async { Err::<u32, _>(TestError::Failed("boom")) })
            .await;
        assert_eq!(first, Err(TestError::Failed("boom")));
        assert!(cache.get("key").is_none());

        let second = cache.get_or_create("key", || async { Ok::<_, TestError>(7) }).await;
        assert_eq!(second, Ok(7));
    }

    #[tokio::test]
    async fn panicking_fill_reports_abandoned_and_clears_marker() {
        let cache: ExpiringCache<u32, TestError> = ExpiringCache::new(Duration::from_secs(60));

        let outcome = cache
            .get_or_create("key", || async {
                if true {
                    panic!("fill exploded");
                }
                Ok::<u32, TestError>(0)
            })
            .await;
        assert_eq!(
            outcome,
            Err(TestError::Cache(CacheError::Abandoned {
                key: String::from("key")
            }))
        );

        let retry = cache.get_or_create("key", || async { Ok::<_, TestError>(1) }).await;
        assert_eq!(retry, Ok(1));
    }
}
