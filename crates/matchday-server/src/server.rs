use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header},
    middleware,
    routing::get,
};
use matchday_storage::DynPredictionStore;
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    access::AccessGate,
    cache::{CacheBackend, PredictionCache, create_cache_backend},
    config::{AppConfig, CorsConfig},
    handlers,
    ingest::IngestService,
    middleware as app_middleware,
    serving::ServingService,
    storage::StorageBackend,
};

/// Collaborators shared by the handlers.
///
/// Serving holds only the cache; ingest holds the store and the cache.
#[derive(Clone)]
pub struct AppState {
    pub ingest: Arc<IngestService>,
    pub serving: Arc<ServingService>,
    pub gate: Arc<AccessGate>,
    pub cache: CacheBackend,
    pub store: DynPredictionStore,
    pub legacy_rejection_body: bool,
}

impl AppState {
    pub fn new(
        cfg: &AppConfig,
        store: DynPredictionStore,
        cache: CacheBackend,
    ) -> Result<Self, String> {
        let predictions = PredictionCache::new(cache.clone(), cfg.cache.key.clone(), cfg.cache_ttl());
        let ingest = IngestService::new(store.clone(), predictions.clone(), cfg.insert_timeout())
            .with_label_validation(cfg.ingest.validate_labels);
        let serving = ServingService::new(predictions);
        let gate = AccessGate::from_config(&cfg.access)?;

        Ok(Self {
            ingest: Arc::new(ingest),
            serving: Arc::new(serving),
            gate: Arc::new(gate),
            cache,
            store,
            legacy_rejection_body: cfg.access.legacy_rejection_body,
        })
    }
}

pub fn build_app(cfg: &AppConfig, state: AppState) -> Router {
    let body_limit = cfg.server.body_limit_bytes;
    let cors = cors_layer(&cfg.cors, state.gate.header());

    Router::new()
        .route(
            "/api/v1/predictions",
            get(handlers::get_predictions).post(handlers::post_predictions),
        )
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        // Middleware stack, innermost first: panic guard -> metrics -> cors/compression -> trace -> request id -> body limit
        .layer(CatchPanicLayer::custom(handlers::panic_response))
        .layer(middleware::from_fn(app_middleware::http_metrics))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let req_id = req
                        .extensions()
                        .get::<HeaderValue>()
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = tracing::field::Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>, latency: Duration, span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(middleware::from_fn(app_middleware::request_id))
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
}

fn cors_layer(cfg: &CorsConfig, gate_header: &HeaderName) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::ACCEPT,
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-csrf-token"),
            HeaderName::from_static("x-rapidapi-key"),
            gate_header.clone(),
        ])
        .expose_headers([header::LINK])
        .max_age(Duration::from_secs(300));

    let origins: Vec<HeaderValue> = cfg
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

pub struct MatchdayServer {
    addr: SocketAddr,
    app: Router,
    storage: StorageBackend,
}

pub struct ServerBuilder {
    config: AppConfig,
    storage: Option<StorageBackend>,
    cache: Option<CacheBackend>,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            storage: None,
            cache: None,
        }
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.config = cfg;
        self
    }

    /// Use an already constructed store instead of the configured one.
    pub fn with_storage(mut self, storage: StorageBackend) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Use an already constructed cache instead of the configured one.
    pub fn with_cache(mut self, cache: CacheBackend) -> Self {
        self.cache = Some(cache);
        self
    }

    pub async fn build(self) -> anyhow::Result<MatchdayServer> {
        let storage = match self.storage {
            Some(storage) => storage,
            None => StorageBackend::from_config(&self.config.storage).await?,
        };
        let cache = match self.cache {
            Some(cache) => cache,
            None => create_cache_backend(&self.config.redis).await?,
        };

        let state =
            AppState::new(&self.config, storage.as_dyn(), cache).map_err(anyhow::Error::msg)?;
        let app = build_app(&self.config, state);

        Ok(MatchdayServer {
            addr: self.config.addr(),
            app,
            storage,
        })
    }
}

impl MatchdayServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Serve until ctrl-c or SIGTERM, then release the store.
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        self.storage.close().await;
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
