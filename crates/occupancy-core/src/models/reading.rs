use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::FacilityId;

/// Occupancy of a single facility as extracted from the listing.
///
/// Only built by the document parser after range validation, so
/// `percentage` is always within `0..=100` and `name` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancyReading {
    pub name: String,
    pub percentage: u8,
}

impl OccupancyReading {
    pub fn level(&self) -> OccupancyLevel {
        OccupancyLevel::from_percentage(self.percentage)
    }
}

/// Coarse utilization band used for color coding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OccupancyLevel {
    Low,
    Moderate,
    High,
}

impl OccupancyLevel {
    pub fn from_percentage(percentage: u8) -> Self {
        match percentage {
            p if p > 30 => OccupancyLevel::High,
            p if p > 16 => OccupancyLevel::Moderate,
            _ => OccupancyLevel::Low,
        }
    }
}

/// Where a facility's reading came from in this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingSource {
    Live,
    Cached,
    Unavailable,
}

/// Final per-facility outcome of a refresh cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacilityResult {
    pub id: FacilityId,
    pub reading: Option<OccupancyReading>,
    pub source: ReadingSource,
    /// Timestamp of the cache entry used, for `Cached` results.
    pub cached_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub cache_age: Option<Duration>,
    /// Why no reading could be produced, for `Unavailable` results.
    pub failure: Option<String>,
}

impl FacilityResult {
    pub fn live(id: FacilityId, reading: OccupancyReading) -> Self {
        Self {
            id,
            reading: Some(reading),
            source: ReadingSource::Live,
            cached_at: None,
            cache_age: None,
            failure: None,
        }
    }

    pub fn cached(
        id: FacilityId,
        reading: OccupancyReading,
        cached_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            reading: Some(reading),
            source: ReadingSource::Cached,
            cached_at: Some(cached_at),
            cache_age: Some(now - cached_at),
            failure: None,
        }
    }

    pub fn unavailable(id: FacilityId, failure: String) -> Self {
        Self {
            id,
            reading: None,
            source: ReadingSource::Unavailable,
            cached_at: None,
            cache_age: None,
            failure: Some(failure),
        }
    }

    pub fn is_available(&self) -> bool {
        self.reading.is_some()
    }

    pub fn percentage(&self) -> Option<u8> {
        self.reading.as_ref().map(|r| r.percentage)
    }
}

/// Ordered results of one refresh cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub results: Vec<FacilityResult>,
    pub refreshed_at: DateTime<Utc>,
    pub next_refresh_at: DateTime<Utc>,
    /// True when at least one result was served from cache.
    pub offline: bool,
}

impl CycleReport {
    pub fn new(results: Vec<FacilityResult>, refreshed_at: DateTime<Utc>, interval: Duration) -> Self {
        let offline = results.iter().any(|r| r.source == ReadingSource::Cached);
        Self {
            results,
            refreshed_at,
            next_refresh_at: refreshed_at + interval,
            offline,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(percentage: u8) -> OccupancyReading {
        OccupancyReading {
            name: "WOF 1".to_string(),
            percentage,
        }
    }

    #[test]
    fn test_occupancy_level_thresholds() {
        assert_eq!(OccupancyLevel::from_percentage(0), OccupancyLevel::Low);
        assert_eq!(OccupancyLevel::from_percentage(16), OccupancyLevel::Low);
        assert_eq!(OccupancyLevel::from_percentage(17), OccupancyLevel::Moderate);
        assert_eq!(OccupancyLevel::from_percentage(30), OccupancyLevel::Moderate);
        assert_eq!(OccupancyLevel::from_percentage(31), OccupancyLevel::High);
        assert_eq!(OccupancyLevel::from_percentage(100), OccupancyLevel::High);
    }

    #[test]
    fn test_cached_result_age() {
        let now = Utc::now();
        let id = FacilityId::new(2).unwrap();
        let result = FacilityResult::cached(id, reading(20), now - Duration::minutes(10), now);
        assert_eq!(result.source, ReadingSource::Cached);
        assert_eq!(result.cache_age, Some(Duration::minutes(10)));
        assert_eq!(result.percentage(), Some(20));
    }

    #[test]
    fn test_report_offline_flag() {
        let now = Utc::now();
        let id = FacilityId::new(1).unwrap();
        let live = CycleReport::new(vec![FacilityResult::live(id, reading(45))], now, Duration::minutes(15));
        assert!(!live.offline);
        assert_eq!(live.next_refresh_at, now + Duration::minutes(15));

        let mixed = CycleReport::new(
            vec![
                FacilityResult::live(id, reading(45)),
                FacilityResult::cached(id, reading(20), now, now),
            ],
            now,
            Duration::minutes(15),
        );
        assert!(mixed.offline);
    }

    #[test]
    fn test_result_serializes_source_lowercase() {
        let id = FacilityId::new(3).unwrap();
        let json = serde_json::to_value(FacilityResult::unavailable(id, "no data".into())).unwrap();
        assert_eq!(json["source"], "unavailable");
        assert_eq!(json["id"], 3);
        assert!(json.get("cache_age").is_none());
    }
}
