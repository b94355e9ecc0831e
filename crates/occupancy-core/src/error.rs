use thiserror::Error;

use crate::models::FacilityId;

/// Failure to extract a reading from the listing document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid document format: no table found")]
    MalformedDocument,

    /// `available` is sorted ascending and holds every facility found in the document.
    #[error("Facility {requested} not found!\nAvailable facilities: {}", join_ids(.available))]
    FacilityNotFound {
        requested: FacilityId,
        available: Vec<FacilityId>,
    },

    #[error("Invalid occupancy value for {name}: {value}")]
    InvalidOccupancyValue { name: String, value: String },
}

fn join_ids(ids: &[FacilityId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Cache I/O failure. Always logged and swallowed by the refresh cycle.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache I/O failed for {key}: {source}")]
    IoFailure {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt cache entry {key}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode cache entry: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Terminal outcomes of a refresh cycle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    /// Neither live data nor a usable cache entry exists for a facility.
    #[error("No data available for facility {facility}: {reason}")]
    NoDataAvailable { facility: FacilityId, reason: String },

    /// Every requested facility ended in `NoDataAvailable`; carries the first one.
    #[error("{first}")]
    CycleFailed { first: Box<RefreshError> },
}

impl RefreshError {
    pub fn facility(&self) -> FacilityId {
        match self {
            RefreshError::NoDataAvailable { facility, .. } => *facility,
            RefreshError::CycleFailed { first } => first.facility(),
        }
    }
}
