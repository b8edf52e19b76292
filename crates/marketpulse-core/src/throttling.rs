use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use log::{debug, warn};
use tokio::time::Instant;

use crate::policy::ProviderPolicy;

/// Sliding-window limiter: at most `max_requests` admissions in any window of
/// length `window`.
///
/// The admission record is guarded by a synchronous mutex whose critical
/// section never spans an `.await`.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    max_requests: usize,
    window: Duration,
    margin: Duration,
    admitted: Mutex<VecDeque<Instant>>,
}

impl SlidingWindowLimiter {
    pub const DEFAULT_MARGIN: Duration = Duration::from_millis(50);

    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests: max_requests.max(1),
            window,
            margin: Self::DEFAULT_MARGIN,
            admitted: Mutex::new(VecDeque::new()),
        }
    }

    pub fn from_policy(policy: &ProviderPolicy) -> Self {
        Self::new(policy.quota_limit, policy.quota_window)
    }

    /// Extra delay added after the oldest admission leaves the window.
    pub fn with_margin(mut self, margin: Duration) -> Self {
        self.margin = margin;
        self
    }

    pub const fn max_requests(&self) -> usize {
        self.max_requests
    }

    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Waits until an admission slot is available and records it.
    pub async fn acquire(&self) {
        loop {
            match self.try_acquire() {
                Ok(()) => return,
                Err(wait) => {
                    debug!(
                        "rate limit of {} per {:?} reached, waiting {:?}",
                        self.max_requests, self.window, wait
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    /// Single admission attempt. Returns the suggested wait when the window is full.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        let now = Instant::now();
        let mut admitted = self.lock();
        self.prune(&mut admitted, now);

        if admitted.len() < self.max_requests {
            admitted.push_back(now);
            return Ok(());
        }

        let oldest = admitted.front().copied().unwrap_or(now);
        let remaining = self.window.saturating_sub(now.duration_since(oldest));
        Err(remaining + self.margin)
    }

    /// Admissions currently inside the window.
    pub fn in_window(&self) -> usize {
        let mut admitted = self.lock();
        self.prune(&mut admitted, Instant::now());
        admitted.len()
    }

    fn prune(&self, admitted: &mut VecDeque<Instant>, now: Instant) {
        while let Some(oldest) = admitted.front() {
            if now.duration_since(*oldest) < self.window {
                break;
            }
            admitted.pop_front();
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Instant>> {
        self.admitted.lock().unwrap_or_else(|poisoned| {
            warn!("rate limiter state was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}
