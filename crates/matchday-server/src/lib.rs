pub mod access;
pub mod cache;
pub mod config;
pub mod handlers;
pub mod ingest;
pub mod metrics;
pub mod middleware;
pub mod observability;
pub mod server;
pub mod serving;
pub mod storage;

pub use access::{AccessGate, AuthError};
pub use cache::{CacheBackend, CacheError, FetchError, PredictionCache, create_cache_backend};
pub use config::{AppConfig, RedisConfig, StorageBackendKind};
pub use ingest::{IngestError, IngestReceipt, IngestService};
pub use server::{AppState, MatchdayServer, ServerBuilder, build_app};
pub use serving::ServingService;
pub use storage::StorageBackend;
