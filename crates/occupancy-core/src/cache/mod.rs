//! Local caching module for offline data access.
//!
//! `CacheStore` keeps one timestamped snapshot per facility in an injected
//! `BlobStore`. Entries are JSON (`{"timestamp": ..., "data": {...}}`) and are
//! ignored once older than the configured max age (60 minutes by default).

pub mod blob;
pub mod manager;

pub use blob::{BlobStore, FileBlobStore, MemoryBlobStore};
pub use manager::{cache_key, CacheEntry, CacheStore};
