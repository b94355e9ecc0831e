//! Per-facility choice between live data, cached data and no data.

use tracing::{info, warn};

use crate::cache::CacheEntry;
use crate::error::{ParseError, RefreshError};
use crate::models::{FacilityId, OccupancyReading};

/// Outcome of the freshness decision for one facility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Freshly parsed; the caller persists it to the cache.
    Live(OccupancyReading),
    /// Served from a still-valid cache entry.
    Cached(CacheEntry),
}

#[derive(Debug, Clone, Copy)]
pub struct FreshnessPolicy {
    offline_mode_enabled: bool,
}

impl FreshnessPolicy {
    pub fn new(offline_mode_enabled: bool) -> Self {
        Self {
            offline_mode_enabled,
        }
    }

    /// Decide what to show for `facility`.
    ///
    /// `live` is `None` when the network (probe or fetch) was unavailable,
    /// otherwise the parse outcome against the fetched document. `cached`
    /// must already be filtered by max age.
    ///
    /// | network | live parse | cache  | result                     |
    /// |---------|------------|--------|----------------------------|
    /// | up      | ok         | any    | `Live`                     |
    /// | up      | failed     | some   | `Cached`                   |
    /// | up      | failed     | none   | `NoDataAvailable`          |
    /// | down    | -          | some   | `Cached` if offline mode   |
    /// | down    | -          | none   | `NoDataAvailable`          |
    pub fn resolve(
        &self,
        facility: FacilityId,
        live: Option<Result<OccupancyReading, ParseError>>,
        cached: Option<CacheEntry>,
    ) -> Result<Resolution, RefreshError> {
        match (live, cached) {
            (Some(Ok(reading)), _) => Ok(Resolution::Live(reading)),
            (Some(Err(e)), Some(entry)) => {
                warn!(facility = %facility, error = %e, "Live data failed, using cached reading");
                Ok(Resolution::Cached(entry))
            }
            (Some(Err(e)), None) => {
                warn!(facility = %facility, error = %e, "Live data failed and no cache available");
                Err(RefreshError::NoDataAvailable {
                    facility,
                    reason: e.to_string(),
                })
            }
            (None, Some(entry)) if self.offline_mode_enabled => {
                info!(facility = %facility, "Network unavailable, using cached reading");
                Ok(Resolution::Cached(entry))
            }
            (None, Some(_)) => Err(RefreshError::NoDataAvailable {
                facility,
                reason: "no network connection and offline mode is disabled".to_string(),
            }),
            (None, None) => Err(RefreshError::NoDataAvailable {
                facility,
                reason: "no network connection and no cache available".to_string(),
            }),
        }
    }
}
