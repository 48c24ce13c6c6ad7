use matchday_db_postgres::PostgresConfig;
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, time::Duration};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    /// Redis configuration
    #[serde(default)]
    pub redis: RedisConfig,
    /// Prediction cache entry settings
    #[serde(default)]
    pub cache: CacheConfig,
    /// Read-endpoint access gate
    #[serde(default)]
    pub access: AccessConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.server.body_limit_bytes == 0 {
            return Err("server.body_limit_bytes must be > 0".into());
        }
        if self.storage.insert_timeout_ms == 0 {
            return Err("storage.insert_timeout_ms must be > 0".into());
        }
        if self.storage.backend == StorageBackendKind::Postgres {
            match &self.storage.postgres {
                None => {
                    return Err(
                        "storage.backend = \"postgres\" requires storage.postgres.url".into(),
                    );
                }
                Some(pg) if pg.url.trim().is_empty() => {
                    return Err("storage.postgres.url must not be empty".into());
                }
                Some(pg) if pg.pool_size == 0 => {
                    return Err("storage.postgres.pool_size must be > 0".into());
                }
                Some(_) => {}
            }
        }
        if self.redis.enabled {
            if self.redis.url.trim().is_empty() {
                return Err("redis.url must not be empty when redis is enabled".into());
            }
            if self.redis.pool_size == 0 {
                return Err("redis.pool_size must be > 0".into());
            }
        }
        if self.redis.timeout_ms == 0 {
            return Err("redis.timeout_ms must be > 0".into());
        }
        if self.cache.key.trim().is_empty() {
            return Err("cache.key must not be empty".into());
        }
        if self.cache.ttl_secs == 0 {
            return Err("cache.ttl_secs must be > 0".into());
        }
        if self.access.header.trim().is_empty() {
            return Err("access.header must not be empty".into());
        }
        if axum::http::HeaderName::from_bytes(self.access.header.as_bytes()).is_err() {
            return Err(format!(
                "access.header {:?} is not a valid header name",
                self.access.header
            ));
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }

    pub fn insert_timeout(&self) -> Duration {
        Duration::from_millis(self.storage.insert_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}
fn default_body_limit() -> usize {
    4 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

/// Which durable store backs ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackendKind,
    #[serde(default)]
    pub postgres: Option<PostgresConfig>,
    /// Deadline for each durable insert.
    #[serde(default = "default_insert_timeout_ms")]
    pub insert_timeout_ms: u64,
}

fn default_insert_timeout_ms() -> u64 {
    5000
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendKind::default(),
            postgres: None,
            insert_timeout_ms: default_insert_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Use Redis for the prediction cache. Off unless set here or
    /// `REDIS_URL` is present; there is no implicit `redis:6379` fallback.
    /// When off, an in-process cache is used, which is only correct for a
    /// single instance.
    #[serde(default)]
    pub enabled: bool,

    /// Redis URL. A bare `host:port` is accepted and gets `redis://` prepended.
    #[serde(default = "default_redis_url")]
    pub url: String,

    /// Injected into the URL when the URL carries no password.
    #[serde(default)]
    pub password: Option<String>,

    #[serde(default = "default_redis_pool_size")]
    pub pool_size: usize,

    /// Deadline for pool checkout and for each cache command.
    #[serde(default = "default_redis_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_redis_url() -> String {
    "redis://redis:6379".to_string()
}

fn default_redis_pool_size() -> usize {
    10
}

fn default_redis_timeout_ms() -> u64 {
    2000
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: default_redis_url(),
            password: None,
            pool_size: default_redis_pool_size(),
            timeout_ms: default_redis_timeout_ms(),
        }
    }
}

impl RedisConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Key holding today's batch.
    #[serde(default = "default_cache_key")]
    pub key: String,

    /// Lifetime of a published batch. Defaults to 30 hours.
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_cache_key() -> String {
    "predictions:today".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    30 * 60 * 60
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            key: default_cache_key(),
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Gate `GET /api/v1/predictions` behind the shared secret.
    #[serde(default = "default_access_enabled")]
    pub enabled: bool,

    #[serde(default = "default_access_header")]
    pub header: String,

    /// Expected secret. Empty rejects every request.
    #[serde(default)]
    pub secret: String,

    /// Answer rejections with a plain-text `404` body and status 401.
    #[serde(default)]
    pub legacy_rejection_body: bool,
}

fn default_access_enabled() -> bool {
    true
}

fn default_access_header() -> String {
    "X-RapidAPI-Proxy-Secret".to_string()
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            enabled: default_access_enabled(),
            header: default_access_header(),
            secret: String::new(),
            legacy_rejection_body: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IngestConfig {
    /// Reject batches whose outcome labels fall outside their market's set.
    #[serde(default)]
    pub validate_labels: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CorsConfig {
    /// Allowed origins. Empty allows any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::{AppConfig, StorageBackendKind};
    use config::{Config, Environment, File, Map};
    use matchday_db_postgres::PostgresConfig;
    use std::path::PathBuf;

    /// Deployment variables honoured on top of file and `MATCHDAY__*` settings.
    pub const LEGACY_ENV_VARS: [&str; 5] = [
        "PORT",
        "REDIS_URL",
        "REDIS_PASSWORD",
        "DATABASE_URL",
        "RAPIDAPI_PROXY_SECRET",
    ];

    /// Deployment variables that are recognised but have no effect.
    pub const UNSUPPORTED_ENV_VARS: [(&str, &str); 1] = [(
        "MONGO_URI",
        "the durable store is PostgreSQL; set DATABASE_URL or storage.postgres.url",
    )];

    /// Loads configuration from the optional file and the process environment.
    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        load_config_with_env(path, std::env::vars().collect())
    }

    /// Loads configuration with an explicit environment map.
    pub fn load_config_with_env(
        path: Option<&str>,
        env: Map<String, String>,
    ) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                let pathbuf = PathBuf::from(p);
                if pathbuf.exists() {
                    builder = builder.add_source(File::from(pathbuf));
                }
            }
            None => {
                let default_path = PathBuf::from("matchday.toml");
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        // Environment variable overrides, e.g., MATCHDAY__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("MATCHDAY")
                .try_parsing(true)
                .separator("__")
                .source(Some(env.clone())),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let mut merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;

        apply_legacy_env(&mut merged, |key| env.get(key).cloned())?;
        for (var, hint) in unsupported_legacy_env(|key| env.get(key).cloned()) {
            tracing::warn!(var, hint, "ignoring unsupported deployment variable");
        }

        merged.validate()?;
        Ok(merged)
    }

    /// Applies the plain deployment variables (`PORT`, `REDIS_URL`, ...).
    pub fn apply_legacy_env(
        cfg: &mut AppConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), String> {
        if let Some(port) = lookup("PORT") {
            cfg.server.port = port
                .trim()
                .parse()
                .map_err(|e| format!("PORT must be a port number: {e}"))?;
        }
        if let Some(url) = lookup("REDIS_URL") {
            cfg.redis.enabled = true;
            cfg.redis.url = normalize_redis_url(&url);
        }
        if let Some(password) = lookup("REDIS_PASSWORD")
            && !password.is_empty()
        {
            cfg.redis.password = Some(password);
        }
        if let Some(url) = lookup("DATABASE_URL")
            && !url.trim().is_empty()
        {
            cfg.storage.backend = StorageBackendKind::Postgres;
            let pg = cfg.storage.postgres.take().unwrap_or_default();
            cfg.storage.postgres = Some(PostgresConfig { url, ..pg });
        }
        if let Some(secret) = lookup("RAPIDAPI_PROXY_SECRET") {
            cfg.access.secret = secret;
        }
        Ok(())
    }

    /// Unsupported variables that are set and non-empty, with a hint each.
    pub fn unsupported_legacy_env(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Vec<(&'static str, &'static str)> {
        UNSUPPORTED_ENV_VARS
            .into_iter()
            .filter(|(var, _)| lookup(var).is_some_and(|v| !v.trim().is_empty()))
            .collect()
    }

    /// Prepends `redis://` to a bare `host:port`.
    pub fn normalize_redis_url(url: &str) -> String {
        let url = url.trim();
        if url.contains("://") {
            url.to_string()
        } else {
            format!("redis://{url}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::loader::{
        apply_legacy_env, load_config_with_env, normalize_redis_url, unsupported_legacy_env,
    };
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> config::Map<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.cache.key, "predictions:today");
        assert_eq!(cfg.cache_ttl(), Duration::from_secs(108_000));
        assert_eq!(cfg.access.header, "X-RapidAPI-Proxy-Secret");
        assert!(cfg.access.enabled);
        assert!(cfg.access.secret.is_empty());
        assert!(!cfg.ingest.validate_labels);
        assert_eq!(cfg.storage.backend, StorageBackendKind::Memory);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut cfg = AppConfig::default();
        cfg.cache.ttl_secs = 0;
        assert!(cfg.validate().unwrap_err().contains("cache.ttl_secs"));

        let mut cfg = AppConfig::default();
        cfg.storage.backend = StorageBackendKind::Postgres;
        assert!(cfg.validate().unwrap_err().contains("storage.postgres"));

        let mut cfg = AppConfig::default();
        cfg.logging.level = "loud".into();
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.access.header = "bad header".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn legacy_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("PORT", "9191"),
            ("REDIS_URL", "cache.internal:6380"),
            ("REDIS_PASSWORD", "hunter2"),
            ("DATABASE_URL", "postgres://app@db/matchday"),
            ("RAPIDAPI_PROXY_SECRET", "s3cret"),
        ]
        .into_iter()
        .collect();

        let mut cfg = AppConfig::default();
        apply_legacy_env(&mut cfg, |k| vars.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(cfg.server.port, 9191);
        assert!(cfg.redis.enabled);
        assert_eq!(cfg.redis.url, "redis://cache.internal:6380");
        assert_eq!(cfg.redis.password.as_deref(), Some("hunter2"));
        assert_eq!(cfg.storage.backend, StorageBackendKind::Postgres);
        assert_eq!(
            cfg.storage.postgres.as_ref().map(|p| p.url.as_str()),
            Some("postgres://app@db/matchday")
        );
        assert_eq!(cfg.access.secret, "s3cret");
    }

    #[test]
    fn mongo_uri_is_reported_and_leaves_storage_alone() {
        let env_map = env(&[("MONGO_URI", "mongodb://mongo:27017/predictions")]);
        let lookup = |k: &str| env_map.get(k).cloned();

        let unsupported = unsupported_legacy_env(lookup);
        assert_eq!(unsupported.len(), 1);
        assert_eq!(unsupported[0].0, "MONGO_URI");

        let cfg = load_config_with_env(Some("does-not-exist.toml"), env_map.clone()).unwrap();
        assert_eq!(cfg.storage.backend, StorageBackendKind::Memory);
        assert!(unsupported_legacy_env(|_| Some(" ".to_string())).is_empty());
    }

    #[test]
    fn redis_stays_off_without_redis_url() {
        let cfg = load_config_with_env(Some("does-not-exist.toml"), env(&[])).unwrap();
        assert!(!cfg.redis.enabled);
    }

    #[test]
    fn legacy_port_must_parse() {
        let mut cfg = AppConfig::default();
        let err = apply_legacy_env(&mut cfg, |k| (k == "PORT").then(|| "http".to_string()));
        assert!(err.is_err());
    }

    #[test]
    fn normalize_redis_url_keeps_explicit_scheme() {
        assert_eq!(normalize_redis_url("redis:6379"), "redis://redis:6379");
        assert_eq!(normalize_redis_url("rediss://host:6380"), "rediss://host:6380");
    }

    #[test]
    fn prefixed_env_overrides_sections() {
        let cfg = load_config_with_env(
            Some("does-not-exist.toml"),
            env(&[
                ("MATCHDAY__CACHE__TTL_SECS", "60"),
                ("MATCHDAY__INGEST__VALIDATE_LABELS", "true"),
                ("MATCHDAY__LOGGING__LEVEL", "debug"),
            ]),
        )
        .unwrap();

        assert_eq!(cfg.cache.ttl_secs, 60);
        assert!(cfg.ingest.validate_labels);
        assert_eq!(cfg.logging.level, "debug");
    }

    #[test]
    fn file_settings_are_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matchday.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 7000

[access]
secret = "from-file"
legacy_rejection_body = true
"#,
        )
        .unwrap();

        let cfg = load_config_with_env(path.to_str(), env(&[("PORT", "7001")])).unwrap();
        assert_eq!(cfg.server.port, 7001);
        assert_eq!(cfg.access.secret, "from-file");
        assert!(cfg.access.legacy_rejection_body);
    }
}
