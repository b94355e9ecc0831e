//! Data models for facility occupancy.
//!
//! - `FacilityId`: positive facility number and request-list parsing
//! - `OccupancyReading`: validated name + percentage pair
//! - `FacilityResult`, `CycleReport`: outcome of a refresh cycle

pub mod facility;
pub mod reading;

pub use facility::{parse_facility_ids, FacilityId, MAX_REQUESTED_FACILITIES};
pub use reading::{CycleReport, FacilityResult, OccupancyLevel, OccupancyReading, ReadingSource};
