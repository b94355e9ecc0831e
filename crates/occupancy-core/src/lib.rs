//! Occupancy core - live facility occupancy with an offline cache fallback.
//!
//! A refresh cycle probes the network, fetches the occupancy listing once,
//! extracts each requested facility's reading, and falls back to the last
//! cached reading (at most an hour old by default) whenever live data is
//! unavailable.
//!
//! ```no_run
//! use occupancy_core::{
//!     parse_facility_ids, Config, FileBlobStore, HttpFetcher, RefreshOrchestrator, TableParser,
//! };
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::load()?;
//! let facilities = parse_facility_ids(Some("1;2"), config.facility_delimiter, config.default_facility);
//! let fetcher = HttpFetcher::new(config.fetch_timeout())?;
//! let blobs = FileBlobStore::new(config.cache_dir()?)?;
//! let parser = TableParser::new(&config.facility_label)?;
//!
//! let orchestrator = RefreshOrchestrator::new(config, fetcher, blobs, parser);
//! let report = orchestrator.run_cycle(&facilities).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod freshness;
pub mod models;
pub mod parser;
pub mod refresh;
pub mod scheduler;
pub mod utils;

pub use api::{DocumentFetcher, FetchError, HttpFetcher};
pub use cache::{BlobStore, CacheEntry, CacheStore, FileBlobStore, MemoryBlobStore};
pub use config::Config;
pub use error::{CacheError, ParseError, RefreshError};
pub use freshness::{FreshnessPolicy, Resolution};
pub use models::{
    parse_facility_ids, CycleReport, FacilityId, FacilityResult, OccupancyLevel,
    OccupancyReading, ReadingSource,
};
pub use parser::{ReadingParser, TableParser};
pub use refresh::RefreshOrchestrator;
pub use scheduler::watch;
