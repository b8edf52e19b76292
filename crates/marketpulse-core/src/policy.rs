use std::time::Duration;

use crate::ProviderId;

/// Request quota and history cache lifetime for one provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderPolicy {
    pub provider_id: ProviderId,
    pub quota_window: Duration,
    pub quota_limit: usize,
    pub history_ttl: Duration,
}

impl ProviderPolicy {
    /// Free tier: 8 credits per minute, one kept in reserve.
    pub fn twelvedata_default() -> Self {
        Self {
            provider_id: ProviderId::Twelvedata,
            quota_window: Duration::from_secs(60),
            quota_limit: 7,
            history_ttl: Duration::from_secs(30 * 60),
        }
    }
}

/// Staleness and sanity thresholds for the listing directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryPolicy {
    /// Snapshots younger than this are served without a download.
    pub max_age: Duration,
    /// A refresh with this many rows or fewer is treated as a failure.
    pub row_floor: usize,
}

impl Default for DirectoryPolicy {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(14 * 24 * 60 * 60),
            row_floor: 100,
        }
    }
}

/// Pacing for bulk watchlist refreshes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshPolicy {
    pub pacing_delay: Duration,
    pub min_refresh_interval: Duration,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            pacing_delay: Duration::from_millis(1_050),
            min_refresh_interval: Duration::from_secs(60),
        }
    }
}
