//! One refresh cycle: probe, fetch once, resolve each facility, aggregate.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::api::DocumentFetcher;
use crate::cache::{BlobStore, CacheStore};
use crate::config::Config;
use crate::error::{CacheError, RefreshError};
use crate::freshness::{FreshnessPolicy, Resolution};
use crate::models::{CycleReport, FacilityId, FacilityResult};
use crate::parser::ReadingParser;

/// Coordinates the network, the parser and the cache for refresh cycles.
///
/// Holds no state between cycles besides what the cache store persists.
pub struct RefreshOrchestrator<F, B> {
    config: Config,
    fetcher: F,
    parser: Box<dyn ReadingParser>,
    cache: CacheStore<B>,
    policy: FreshnessPolicy,
}

impl<F: DocumentFetcher, B: BlobStore> RefreshOrchestrator<F, B> {
    pub fn new(config: Config, fetcher: F, blobs: B, parser: impl ReadingParser + 'static) -> Self {
        let cache = CacheStore::new(blobs, config.cache_max_age());
        let policy = FreshnessPolicy::new(config.offline_mode_enabled);
        Self {
            config,
            fetcher,
            parser: Box::new(parser),
            cache,
            policy,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &CacheStore<B> {
        &self.cache
    }

    /// Whether the reachability endpoint answers with the expected marker
    /// within the probe timeout.
    pub async fn probe_network(&self) -> bool {
        let probe = self.fetcher.fetch(&self.config.probe_url);
        match tokio::time::timeout(self.config.probe_timeout(), probe).await {
            Ok(Ok(body)) if body.contains(&self.config.probe_marker) => true,
            Ok(Ok(_)) => {
                info!(url = %self.config.probe_url, "Network probe answered without marker");
                false
            }
            Ok(Err(e)) => {
                info!(error = %e, "Network not available");
                false
            }
            Err(_) => {
                info!(timeout_secs = self.config.probe_timeout_secs, "Network probe timed out");
                false
            }
        }
    }

    /// The shared listing document, or `None` when offline. A failed or
    /// timed-out fetch counts as offline.
    async fn fetch_document(&self) -> Option<String> {
        if !self.probe_network().await {
            return None;
        }

        let fetch = self.fetcher.fetch(&self.config.source_url);
        match tokio::time::timeout(self.config.fetch_timeout(), fetch).await {
            Ok(Ok(document)) => Some(document),
            Ok(Err(e)) => {
                warn!(url = %self.config.source_url, error = %e, "Failed to fetch occupancy listing");
                None
            }
            Err(_) => {
                warn!(
                    url = %self.config.source_url,
                    timeout_secs = self.config.fetch_timeout_secs,
                    "Fetching occupancy listing timed out"
                );
                None
            }
        }
    }

    /// Resolve every requested facility, in order.
    ///
    /// Facilities without any data are reported as unavailable; the cycle
    /// only fails, with the first such error, when none could be resolved.
    pub async fn run_cycle(&self, facilities: &[FacilityId]) -> Result<CycleReport, RefreshError> {
        info!(count = facilities.len(), "Starting refresh cycle");

        let document = self.fetch_document().await;
        let now = Utc::now();

        let mut results = Vec::with_capacity(facilities.len());
        let mut first_failure = None;

        for &facility in facilities {
            match self.resolve_facility(facility, document.as_deref(), now) {
                Ok(result) => results.push(result),
                Err(e) => {
                    results.push(FacilityResult::unavailable(facility, e.to_string()));
                    first_failure.get_or_insert(e);
                }
            }
        }

        if let Some(first) = first_failure {
            if !results.iter().any(FacilityResult::is_available) {
                warn!(error = %first, "Refresh cycle produced no data");
                return Err(RefreshError::CycleFailed {
                    first: Box::new(first),
                });
            }
        }

        let report = CycleReport::new(results, now, self.config.refresh_interval());
        info!(offline = report.offline, "Refresh cycle complete");
        Ok(report)
    }

    fn resolve_facility(
        &self,
        facility: FacilityId,
        document: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<FacilityResult, RefreshError> {
        let cached = self.cache.read_latest_at(facility, now);
        let live = document.map(|document| self.parser.parse(document, facility));

        match self.policy.resolve(facility, live, cached)? {
            Resolution::Live(reading) => {
                debug!(facility = %facility, percentage = reading.percentage, "Live reading");
                if let Err(e) = self.cache.write(facility, &reading) {
                    warn!(facility = %facility, error = %e, "Failed to cache reading");
                }
                Ok(FacilityResult::live(facility, reading))
            }
            Resolution::Cached(entry) => Ok(FacilityResult::cached(
                facility,
                entry.reading,
                entry.timestamp,
                now,
            )),
        }
    }

    /// Remove cache entries older than the configured cleanup age.
    pub fn cleanup_cache(&self) -> Result<usize, CacheError> {
        self.cache.cleanup(self.config.cleanup_max_age())
    }
}
