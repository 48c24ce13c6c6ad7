//! Cache backend: in-process DashMap or shared Redis.

use dashmap::DashMap;
use deadpool_redis::Pool;
use redis::AsyncCommands;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::RedisConfig;

/// Errors reaching or commanding the cache.
///
/// A missing key is not an error; see [`CacheBackend::get`].
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache connection error: {0}")]
    Connection(String),

    #[error("cache command failed: {0}")]
    Command(#[from] redis::RedisError),

    #[error("cache operation timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("cache configuration error: {0}")]
    Config(String),

    #[error("failed to serialize cache value: {0}")]
    Serialization(String),
}

/// A cached entry with TTL support.
#[derive(Clone, Debug)]
pub struct CachedEntry {
    pub data: Arc<Vec<u8>>,
    pub cached_at: Instant,
    pub ttl: Duration,
}

impl CachedEntry {
    pub fn new(data: Vec<u8>, ttl: Duration) -> Self {
        Self {
            data: Arc::new(data),
            cached_at: Instant::now(),
            ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.cached_at.elapsed() >= self.ttl
    }
}

/// Where cache entries live.
///
/// - **Local**: one process, DashMap with per-entry TTL. Each instance has its
///   own view, so only suitable for single-instance deployments and tests.
/// - **Redis**: shared across instances; TTL enforced by Redis (`PSETEX`).
///
/// Every operation reports failures; nothing is retried or swallowed.
#[derive(Clone)]
pub enum CacheBackend {
    Local(Arc<DashMap<String, CachedEntry>>),

    Redis { pool: Pool, op_timeout: Duration },
}

impl std::fmt::Debug for CacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackend::Local(map) => f.debug_tuple("Local").field(&map.len()).finish(),
            CacheBackend::Redis { op_timeout, .. } => f
                .debug_struct("Redis")
                .field("op_timeout", op_timeout)
                .finish_non_exhaustive(),
        }
    }
}

impl CacheBackend {
    pub fn new_local() -> Self {
        CacheBackend::Local(Arc::new(DashMap::new()))
    }

    pub fn new_redis(pool: Pool, op_timeout: Duration) -> Self {
        CacheBackend::Redis { pool, op_timeout }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            CacheBackend::Local(_) => "local",
            CacheBackend::Redis { .. } => "redis",
        }
    }

    /// Fetch a value. `Ok(None)` means the key is absent or expired.
    pub async fn get(&self, key: &str) -> Result<Option<Arc<Vec<u8>>>, CacheError> {
        let result = match self {
            CacheBackend::Local(map) => {
                let hit = map.get(key).map(|entry| {
                    (!entry.is_expired()).then(|| Arc::clone(&entry.data))
                });
                match hit {
                    Some(Some(data)) => Ok(Some(data)),
                    Some(None) => {
                        map.remove_if(key, |_, entry| entry.is_expired());
                        Ok(None)
                    }
                    None => Ok(None),
                }
            }
            CacheBackend::Redis { pool, op_timeout } => {
                with_timeout(*op_timeout, async {
                    let mut conn = pool
                        .get()
                        .await
                        .map_err(|e| CacheError::Connection(e.to_string()))?;
                    let data: Option<Vec<u8>> = conn.get(key).await?;
                    Ok(data.map(Arc::new))
                })
                .await
            }
        };

        match &result {
            Ok(Some(_)) => {
                tracing::debug!(key = %key, mode = self.mode(), "cache hit");
                crate::metrics::record_cache_hit(self.mode());
            }
            Ok(None) => {
                tracing::debug!(key = %key, mode = self.mode(), "cache miss");
                crate::metrics::record_cache_miss(self.mode());
            }
            Err(e) => {
                tracing::warn!(key = %key, mode = self.mode(), error = %e, "cache GET failed");
                crate::metrics::record_cache_error(self.mode(), "get");
            }
        }
        result
    }

    /// Store a value, replacing any previous one, with the given TTL.
    ///
    /// Completes only once the backend has acknowledged the write.
    pub async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let result = match self {
            CacheBackend::Local(map) => {
                map.insert(key.to_string(), CachedEntry::new(value, ttl));
                Ok(())
            }
            CacheBackend::Redis { pool, op_timeout } => {
                // PSETEX rejects a zero TTL
                let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
                with_timeout(*op_timeout, async {
                    let mut conn = pool
                        .get()
                        .await
                        .map_err(|e| CacheError::Connection(e.to_string()))?;
                    conn.pset_ex::<_, _, ()>(key, value, ttl_ms).await?;
                    Ok(())
                })
                .await
            }
        };

        match &result {
            Ok(()) => tracing::debug!(key = %key, mode = self.mode(), ttl_secs = ttl.as_secs(), "cache set"),
            Err(e) => {
                tracing::warn!(key = %key, mode = self.mode(), error = %e, "cache SET failed");
                crate::metrics::record_cache_error(self.mode(), "set");
            }
        }
        result
    }

    /// Connectivity check for readiness. Always succeeds in local mode.
    pub async fn ping(&self) -> Result<(), CacheError> {
        match self {
            CacheBackend::Local(_) => Ok(()),
            CacheBackend::Redis { pool, op_timeout } => {
                with_timeout(*op_timeout, async {
                    let mut conn = pool
                        .get()
                        .await
                        .map_err(|e| CacheError::Connection(e.to_string()))?;
                    let _pong: String = redis::cmd("PING").query_async(&mut conn).await?;
                    Ok(())
                })
                .await
            }
        }
    }
}

async fn with_timeout<T>(
    limit: Duration,
    op: impl Future<Output = Result<T, CacheError>>,
) -> Result<T, CacheError> {
    tokio::time::timeout(limit, op)
        .await
        .map_err(|_| CacheError::Timeout(limit))?
}

/// Builds the connection URL: adds `redis://` to a bare `host:port` and
/// injects the configured password when the URL has none.
pub fn redis_connection_url(config: &RedisConfig) -> Result<String, CacheError> {
    let raw = crate::config::loader::normalize_redis_url(&config.url);
    let mut url = url::Url::parse(&raw)
        .map_err(|e| CacheError::Config(format!("invalid redis.url: {e}")))?;

    if let Some(password) = config.password.as_deref().filter(|p| !p.is_empty())
        && url.password().is_none()
    {
        url.set_password(Some(password))
            .map_err(|_| CacheError::Config("redis.url cannot carry a password".into()))?;
    }
    Ok(url.to_string())
}

/// Create the cache backend from configuration.
///
/// With Redis enabled, an unreachable server at startup is logged but not
/// fatal; reads report the cache as unavailable until it comes back.
pub async fn create_cache_backend(config: &RedisConfig) -> Result<CacheBackend, CacheError> {
    if !config.enabled {
        tracing::warn!(
            "Redis disabled (set REDIS_URL or redis.enabled); using in-process prediction cache, \
             which is only correct for a single instance"
        );
        return Ok(CacheBackend::new_local());
    }

    let url = redis_connection_url(config)?;
    let timeout = config.timeout();

    let mut redis_config = deadpool_redis::Config::from_url(url);
    let mut pool_config = deadpool_redis::PoolConfig::new(config.pool_size);
    pool_config.timeouts.wait = Some(timeout);
    pool_config.timeouts.create = Some(timeout);
    pool_config.timeouts.recycle = Some(timeout);
    redis_config.pool = Some(pool_config);

    let pool = redis_config
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .map_err(|e| CacheError::Config(e.to_string()))?;

    let backend = CacheBackend::new_redis(pool, timeout);
    match backend.ping().await {
        Ok(()) => tracing::info!("Connected to Redis"),
        Err(e) => tracing::warn!(
            error = %e,
            "Redis not reachable at startup; prediction reads will report the cache as unavailable"
        ),
    }
    Ok(backend)
}
