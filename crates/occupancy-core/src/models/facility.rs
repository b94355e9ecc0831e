use std::fmt;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::utils::parse_leading_int;

/// Maximum number of facilities resolved in one refresh cycle.
pub const MAX_REQUESTED_FACILITIES: usize = 3;

/// Positive integer identifying a facility ("WOF 3" -> 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct FacilityId(NonZeroU32);

impl FacilityId {
    /// Facility 1.
    pub const MIN: FacilityId = FacilityId(NonZeroU32::MIN);

    /// Returns `None` for zero.
    pub fn new(id: u32) -> Option<Self> {
        NonZeroU32::new(id).map(Self)
    }

    /// Accepts only values in `1..=u32::MAX`.
    pub fn from_i64(id: i64) -> Option<Self> {
        u32::try_from(id).ok().and_then(Self::new)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for FacilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for FacilityId {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| "facility id must be a positive integer".to_string())
    }
}

impl From<FacilityId> for u32 {
    fn from(id: FacilityId) -> Self {
        id.get()
    }
}

/// Resolve the requested facilities from a delimiter-separated list.
///
/// - absent or blank input yields `[default]`
/// - input without the delimiter yields its single id, or `[default]` if invalid
/// - otherwise every positive entry is kept in order, truncated to
///   [`MAX_REQUESTED_FACILITIES`], falling back to `[default]` when none survive
pub fn parse_facility_ids(
    input: Option<&str>,
    delimiter: char,
    default: FacilityId,
) -> Vec<FacilityId> {
    let input = match input.map(str::trim) {
        Some(s) if !s.is_empty() => s,
        _ => return vec![default],
    };

    if !input.contains(delimiter) {
        return match parse_leading_int(input).and_then(FacilityId::from_i64) {
            Some(id) => vec![id],
            None => vec![default],
        };
    }

    let ids: Vec<FacilityId> = input
        .split(delimiter)
        .filter_map(|part| parse_leading_int(part.trim()).and_then(FacilityId::from_i64))
        .take(MAX_REQUESTED_FACILITIES)
        .collect();

    if ids.is_empty() {
        vec![default]
    } else {
        ids
    }
}
