//! Tracing setup. The filter sits behind a reload layer so the level read
//! from configuration can replace the startup default.

use std::sync::OnceLock;
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

static LOG_RELOAD_HANDLE: OnceLock<reload::Handle<EnvFilter, tracing_subscriber::Registry>> =
    OnceLock::new();

/// Dependencies that are noisy at `debug` and below.
const QUIET_TARGETS: [&str; 4] = ["sqlx=warn", "hyper=warn", "h2=warn", "redis=warn"];

pub fn init_tracing() {
    init_tracing_with_level("info");
}

/// Install the global subscriber. `RUST_LOG`, when set, overrides `level`
/// here and in later [`apply_logging_level`] calls.
pub fn init_tracing_with_level(level: &str) {
    let base_filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|_| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(filter_directive(level)));

    let (reload_layer, handle) = reload::Layer::new(base_filter);
    let _ = LOG_RELOAD_HANDLE.set(handle);

    let _ = tracing_subscriber::registry()
        .with(reload_layer)
        .with(fmt::layer().with_target(true))
        .try_init();
}

/// Replace the active filter with `logging.level` from configuration.
pub fn apply_logging_level(level: &str) {
    if std::env::var_os("RUST_LOG").is_some() {
        return;
    }
    if let Some(handle) = LOG_RELOAD_HANDLE.get() {
        let directive = filter_directive(level);
        match handle.modify(|f| *f = EnvFilter::new(&directive)) {
            Ok(()) => tracing::debug!(filter = %directive, "log filter applied"),
            Err(e) => tracing::warn!(error = %e, "failed to apply log filter"),
        }
    }
}

/// `level` for everything, with chatty dependencies capped at `warn` unless
/// the level is already `warn` or stricter.
fn filter_directive(level: &str) -> String {
    let level = level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" => {
            let mut parts = vec![level.clone()];
            parts.extend(QUIET_TARGETS.iter().map(|t| t.to_string()));
            parts.join(",")
        }
        _ => level,
    }
}
