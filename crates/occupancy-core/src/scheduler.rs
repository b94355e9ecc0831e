//! Periodic refresh cycles with an independent cache cleanup schedule.

use std::ops::ControlFlow;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

use crate::api::DocumentFetcher;
use crate::cache::BlobStore;
use crate::error::RefreshError;
use crate::models::{CycleReport, FacilityId};
use crate::refresh::RefreshOrchestrator;

/// Lower bound for both schedules, so a zero in the config cannot spin.
const MIN_INTERVAL: Duration = Duration::from_secs(60);

/// Run a refresh cycle every `refresh_interval_minutes` and a cache cleanup
/// every `cleanup_interval_hours`, both starting immediately.
///
/// `on_cycle` receives each cycle's outcome; returning `Break` stops the loop.
pub async fn watch<F, B, C>(
    orchestrator: &RefreshOrchestrator<F, B>,
    facilities: &[FacilityId],
    mut on_cycle: C,
) where
    F: DocumentFetcher,
    B: BlobStore,
    C: FnMut(&Result<CycleReport, RefreshError>) -> ControlFlow<()>,
{
    let config = orchestrator.config();
    let refresh_every = config
        .refresh_interval()
        .to_std()
        .unwrap_or(MIN_INTERVAL)
        .max(MIN_INTERVAL);
    let cleanup_every = config.cleanup_interval().max(MIN_INTERVAL);

    let mut refresh = interval(refresh_every);
    refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut cleanup = interval(cleanup_every);
    cleanup.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = refresh.tick() => {
                let outcome = orchestrator.run_cycle(facilities).await;
                if on_cycle(&outcome).is_break() {
                    return;
                }
            }
            _ = cleanup.tick() => {
                match orchestrator.cleanup_cache() {
                    Ok(removed) => debug!(removed, "Scheduled cache cleanup finished"),
                    Err(e) => warn!(error = %e, "Scheduled cache cleanup failed"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, Utc};

    use crate::api::FetchError;
    use crate::cache::{cache_key, CacheEntry, MemoryBlobStore};
    use crate::config::Config;
    use crate::models::OccupancyReading;
    use crate::parser::TableParser;

    struct StaticFetcher;

    #[async_trait]
    impl DocumentFetcher for StaticFetcher {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            if url.contains("probe") {
                Ok("Success".to_string())
            } else {
                Ok("<table><tr><td>WOF 1</td><td>12%</td></tr></table>".to_string())
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_repeats_cycles_and_cleans_cache() {
        let config = Config {
            probe_url: "https://probe.test/".to_string(),
            source_url: "https://listing.test/".to_string(),
            ..Config::default()
        };
        let blobs = Arc::new(MemoryBlobStore::new());
        let ancient = CacheEntry {
            timestamp: Utc::now() - ChronoDuration::days(30),
            reading: OccupancyReading {
                name: "WOF 9".to_string(),
                percentage: 1,
            },
        };
        let facility_9 = FacilityId::new(9).unwrap();
        blobs
            .write(&cache_key(facility_9), &serde_json::to_vec(&ancient).unwrap())
            .unwrap();

        let orch = RefreshOrchestrator::new(
            config,
            StaticFetcher,
            blobs.clone(),
            TableParser::new("WOF").unwrap(),
        );

        let facility_1 = FacilityId::new(1).unwrap();
        let mut cycles = 0;
        watch(&orch, &[facility_1], |outcome| {
            assert_eq!(outcome.as_ref().unwrap().results[0].percentage(), Some(12));
            cycles += 1;
            if cycles == 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .await;

        assert_eq!(cycles, 2);
        assert_eq!(blobs.keys().unwrap(), vec![cache_key(facility_1)]);
    }
}
