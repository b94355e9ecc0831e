//! HTTP client module for the occupancy listing.
//!
//! The listing is a public HTML page; no authentication is involved.

pub mod client;
pub mod error;

pub use client::{DocumentFetcher, HttpFetcher};
pub use error::FetchError;
