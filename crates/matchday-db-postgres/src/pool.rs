//! Pool construction for the predictions database.

use std::time::Duration;

use sqlx_core::pool::PoolOptions;
use sqlx_postgres::{PgPool, Postgres};
use tracing::info;

use crate::config::PostgresConfig;
use crate::error::Result;

/// Connects a pool sized and timed from `config`.
pub async fn create_pool(config: &PostgresConfig) -> Result<PgPool> {
    let pool = pool_options(config).connect(&config.url).await?;
    info!(
        url = %redact_url(&config.url),
        max_connections = config.pool_size,
        "connected to PostgreSQL"
    );
    Ok(pool)
}

/// The idle floor defaults to a quarter of the pool and never exceeds it.
fn pool_options(config: &PostgresConfig) -> PoolOptions<Postgres> {
    let min_connections = config
        .min_connections
        .unwrap_or(config.pool_size / 4)
        .clamp(1, config.pool_size.max(1));

    PoolOptions::<Postgres>::new()
        .max_connections(config.pool_size)
        .min_connections(min_connections)
        .acquire_timeout(Duration::from_millis(config.connect_timeout_ms))
        .idle_timeout(config.idle_timeout_ms.map(Duration::from_millis))
        .max_lifetime(config.max_lifetime_secs.map(Duration::from_secs))
}

/// The URL with any password replaced, for logs. Unparseable input is
/// reduced to its scheme.
pub fn redact_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("****"));
            }
            url.to_string()
        }
        Err(_) => raw
            .split_once("://")
            .map(|(scheme, _)| format!("{scheme}://<redacted>"))
            .unwrap_or_else(|| "<redacted>".to_string()),
    }
}
