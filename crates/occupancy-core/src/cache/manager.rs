use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::CacheError;
use crate::models::{FacilityId, OccupancyReading};
use crate::utils::format_age;

use super::BlobStore;

/// Suffix shared by every cache key; used to recognise entries during cleanup.
const CACHE_KEY_SUFFIX: &str = "_latest_cache";

/// Timestamped snapshot of a facility's last live reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "data")]
    pub reading: OccupancyReading,
}

impl CacheEntry {
    pub fn new(reading: OccupancyReading) -> Self {
        Self {
            timestamp: Utc::now(),
            reading,
        }
    }

    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        now - self.timestamp
    }

    pub fn age_minutes(&self) -> i64 {
        self.age_at(Utc::now()).num_minutes()
    }

    pub fn age_display(&self) -> String {
        format_age(self.age_minutes())
    }

    /// Older than `max_age`; an entry exactly at the boundary is still valid.
    pub fn is_expired_at(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        self.age_at(now) > max_age
    }
}

/// Deterministic blob key for a facility's cache entry.
pub fn cache_key(facility: FacilityId) -> String {
    format!("facility{}{}", facility, CACHE_KEY_SUFFIX)
}

/// Reads and writes one cache entry per facility through a [`BlobStore`].
pub struct CacheStore<B> {
    blobs: B,
    max_age: Duration,
}

impl<B: BlobStore> CacheStore<B> {
    pub fn new(blobs: B, max_age: Duration) -> Self {
        Self { blobs, max_age }
    }

    pub fn blobs(&self) -> &B {
        &self.blobs
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Persist `reading` stamped with the current time, replacing any previous entry.
    pub fn write(&self, facility: FacilityId, reading: &OccupancyReading) -> Result<(), CacheError> {
        self.write_entry(facility, &CacheEntry::new(reading.clone()))
    }

    pub fn write_entry(&self, facility: FacilityId, entry: &CacheEntry) -> Result<(), CacheError> {
        let contents = serde_json::to_vec_pretty(entry)?;
        self.blobs.write(&cache_key(facility), &contents)?;
        debug!(facility = %facility, percentage = entry.reading.percentage, "Cache entry written");
        Ok(())
    }

    /// Latest entry for `facility`, or `None` when missing, unreadable or
    /// older than the configured max age.
    pub fn read_latest(&self, facility: FacilityId) -> Option<CacheEntry> {
        self.read_latest_at(facility, Utc::now())
    }

    pub fn read_latest_at(&self, facility: FacilityId, now: DateTime<Utc>) -> Option<CacheEntry> {
        let entry = match self.load(&cache_key(facility)) {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(e) => {
                warn!(facility = %facility, error = %e, "Failed to load cache entry");
                return None;
            }
        };

        if entry.is_expired_at(self.max_age, now) {
            info!(
                facility = %facility,
                age_minutes = entry.age_at(now).num_minutes(),
                "Cache entry is stale"
            );
            return None;
        }

        Some(entry)
    }

    fn load(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let Some(bytes) = self.blobs.read(key)? else {
            return Ok(None);
        };
        let entry = serde_json::from_slice(&bytes).map_err(|source| CacheError::Corrupt {
            key: key.to_string(),
            source,
        })?;
        Ok(Some(entry))
    }

    /// Delete entries older than `max_age`, plus entries that cannot be decoded.
    /// Returns the number of entries removed.
    pub fn cleanup(&self, max_age: Duration) -> Result<usize, CacheError> {
        self.cleanup_at(max_age, Utc::now())
    }

    pub fn cleanup_at(&self, max_age: Duration, now: DateTime<Utc>) -> Result<usize, CacheError> {
        let mut removed = 0;

        for key in self.blobs.keys()? {
            if !key.ends_with(CACHE_KEY_SUFFIX) {
                continue;
            }

            let expired = match self.load(&key) {
                Ok(Some(entry)) => entry.is_expired_at(max_age, now),
                Ok(None) => false,
                Err(CacheError::Corrupt { .. }) => true,
                Err(e) => {
                    warn!(cache = %key, error = %e, "Skipping unreadable cache entry during cleanup");
                    false
                }
            };
            if !expired {
                continue;
            }

            match self.blobs.delete(&key) {
                Ok(()) => {
                    debug!(cache = %key, "Removed expired cache entry");
                    removed += 1;
                }
                Err(e) => warn!(cache = %key, error = %e, "Failed to remove cache entry"),
            }
        }

        if removed > 0 {
            info!(removed, "Cache cleanup complete");
        }
        Ok(removed)
    }
}
