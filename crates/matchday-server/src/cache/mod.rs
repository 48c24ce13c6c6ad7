//! Prediction cache.
//!
//! Today's batch lives under a single key with a TTL. Ingest overwrites it
//! wholesale; serving only ever reads it.
//!
//! ```text
//! POST → store (per record) → serialize batch → SET key (TTL)
//! GET  → GET key → deserialize → respond
//! ```

pub mod backend;
pub mod batch;

pub use backend::{CacheBackend, CacheError, CachedEntry, create_cache_backend};
pub use batch::{FetchError, PredictionCache};
