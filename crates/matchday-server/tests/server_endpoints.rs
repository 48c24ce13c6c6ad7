//! HTTP surface tests against a server bound to an ephemeral port.
//!
//! Run with: cargo test -p matchday-server --test server_endpoints

mod common;

use std::sync::Arc;

use common::{FailingStore, batch_a, batch_b};
use matchday_db_memory::InMemoryStore;
use matchday_server::{AppConfig, AppState, CacheBackend, RedisConfig, build_app, create_cache_backend};
use matchday_storage::{DynPredictionStore, PredictionStore};
use serde_json::{Value, json};
use tokio::task::JoinHandle;

const SECRET: &str = "s3cret";
const SECRET_HEADER: &str = "X-RapidAPI-Proxy-Secret";

fn config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.access.secret = SECRET.to_string();
    cfg
}

async fn start_server(
    cfg: &AppConfig,
    store: DynPredictionStore,
    cache: CacheBackend,
) -> (String, tokio::sync::oneshot::Sender<()>, JoinHandle<()>) {
    let state = AppState::new(cfg, store, cache).expect("app state");
    let app = build_app(cfg, state);

    // Bind to an ephemeral port
    let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let server = tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = rx.await;
            })
            .await;
    });

    (format!("http://{addr}/api/v1/predictions"), tx, server)
}

async fn start_default() -> (String, tokio::sync::oneshot::Sender<()>, JoinHandle<()>) {
    start_server(&config(), Arc::new(InMemoryStore::new()), CacheBackend::new_local()).await
}

async fn json_body(resp: reqwest::Response) -> Value {
    resp.json().await.expect("json body")
}

#[tokio::test]
async fn post_then_get_returns_exact_batch() {
    let store = Arc::new(InMemoryStore::new());
    let (url, shutdown, handle) =
        start_server(&config(), store.clone(), CacheBackend::new_local()).await;
    let client = reqwest::Client::new();

    let resp = client.post(&url).json(&batch_a()).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        json_body(resp).await,
        json!({"success": true, "message": "Predictions saved successfully"})
    );

    let resp = client
        .get(&url)
        .header(SECRET_HEADER, SECRET)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body = json_body(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"], serde_json::to_value(batch_a()).unwrap());
    assert_eq!(body["data"][0]["1x2"], "1");
    assert_eq!(store.count().await.unwrap(), 2);

    let _ = shutdown.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn get_before_publish_is_not_found() {
    let (url, shutdown, handle) = start_default().await;

    let resp = reqwest::Client::new()
        .get(&url)
        .header(SECRET_HEADER, SECRET)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body = json_body(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "PREDICTIONS_NOT_FOUND");
    assert_eq!(body["error"]["message"], "Predictions not found");

    let _ = shutdown.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn gate_rejects_missing_and_wrong_secret() {
    let (url, shutdown, handle) = start_default().await;
    let client = reqwest::Client::new();
    client.post(&url).json(&batch_a()).send().await.unwrap();

    let missing = client.get(&url).send().await.unwrap();
    assert_eq!(missing.status(), 401);
    assert_eq!(json_body(missing).await["error"]["code"], "UNAUTHORIZED");

    let wrong = client
        .get(&url)
        .header(SECRET_HEADER, "guess")
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status(), 401);

    // Header names are case-insensitive
    let ok = client
        .get(&url)
        .header("x-rapidapi-proxy-secret", SECRET)
        .send()
        .await
        .unwrap();
    assert_eq!(ok.status(), 200);

    let _ = shutdown.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn gate_without_configured_secret_rejects_everyone() {
    let cfg = AppConfig::default();
    let (url, shutdown, handle) =
        start_server(&cfg, Arc::new(InMemoryStore::new()), CacheBackend::new_local()).await;
    let client = reqwest::Client::new();

    let empty = client.get(&url).header(SECRET_HEADER, "").send().await.unwrap();
    assert_eq!(empty.status(), 401);
    let any = client.get(&url).header(SECRET_HEADER, "x").send().await.unwrap();
    assert_eq!(any.status(), 401);

    let _ = shutdown.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn legacy_rejection_body_is_plain_text() {
    let mut cfg = config();
    cfg.access.legacy_rejection_body = true;
    let (url, shutdown, handle) =
        start_server(&cfg, Arc::new(InMemoryStore::new()), CacheBackend::new_local()).await;

    let resp = reqwest::Client::new().get(&url).send().await.unwrap();
    assert_eq!(resp.status(), 401);
    assert!(
        resp.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );
    assert_eq!(resp.text().await.unwrap(), "404\n");

    let _ = shutdown.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn disabled_gate_admits_reads() {
    let mut cfg = AppConfig::default();
    cfg.access.enabled = false;
    let (url, shutdown, handle) =
        start_server(&cfg, Arc::new(InMemoryStore::new()), CacheBackend::new_local()).await;
    let client = reqwest::Client::new();

    client.post(&url).json(&batch_b()).send().await.unwrap();
    let resp = client.get(&url).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(json_body(resp).await["data"].as_array().unwrap().len(), 3);

    let _ = shutdown.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn malformed_post_is_bad_request() {
    let (url, shutdown, handle) = start_default().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(&url)
        .header("content-type", "application/json")
        .body("{ nope")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body = json_body(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "INVALID_BODY");

    let resp = client
        .post(&url)
        .json(&json!([{"home_team": "A", "away_team": "B"}]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let _ = shutdown.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn record_without_home_team_is_accepted() {
    let (url, shutdown, handle) = start_default().await;
    let client = reqwest::Client::new();

    let mut payload = serde_json::to_value(batch_a()).unwrap();
    payload[0].as_object_mut().unwrap().remove("home_team");

    let resp = client.post(&url).json(&payload).send().await.unwrap();
    assert_eq!(resp.status(), 200);

    let resp = client
        .get(&url)
        .header(SECRET_HEADER, SECRET)
        .send()
        .await
        .unwrap();
    let body = json_body(resp).await;
    assert_eq!(body["data"][0]["home_team"], "");
    assert_eq!(body["data"][1]["home_team"], "Lazio");

    let _ = shutdown.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn invalid_labels_rejected_when_validation_enabled() {
    let mut cfg = config();
    cfg.ingest.validate_labels = true;
    let store = Arc::new(InMemoryStore::new());
    let (url, shutdown, handle) =
        start_server(&cfg, store.clone(), CacheBackend::new_local()).await;

    let mut payload = serde_json::to_value(batch_a()).unwrap();
    payload[0]["over_under_2_5g"] = json!("Sideways");

    let resp = reqwest::Client::new().post(&url).json(&payload).send().await.unwrap();
    assert_eq!(resp.status(), 400);
    let body = json_body(resp).await;
    assert_eq!(body["error"]["code"], "VALIDATION_FAILED");
    assert_eq!(body["error"]["details"].as_array().unwrap().len(), 1);
    assert_eq!(store.count().await.unwrap(), 0);

    let _ = shutdown.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn store_failure_is_internal_error_and_keeps_previous_batch() {
    let cache = CacheBackend::new_local();
    let healthy = Arc::new(InMemoryStore::new());
    let (url, shutdown, handle) = start_server(&config(), healthy, cache.clone()).await;
    let client = reqwest::Client::new();
    client.post(&url).json(&batch_a()).send().await.unwrap();
    let _ = shutdown.send(());
    let _ = handle.await;

    // Same cache, store that fails the second insert
    let (url, shutdown, handle) =
        start_server(&config(), Arc::new(FailingStore::failing_at(1)), cache).await;

    let resp = client.post(&url).json(&batch_b()).send().await.unwrap();
    assert_eq!(resp.status(), 500);
    assert_eq!(json_body(resp).await["error"]["code"], "PERSISTENCE_FAILED");

    let resp = client
        .get(&url)
        .header(SECRET_HEADER, SECRET)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        json_body(resp).await["data"],
        serde_json::to_value(batch_a()).unwrap()
    );

    let _ = shutdown.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn unreachable_cache_maps_to_500_and_503() {
    let cache = create_cache_backend(&RedisConfig {
        enabled: true,
        url: "redis://127.0.0.1:1".into(),
        timeout_ms: 300,
        ..Default::default()
    })
    .await
    .unwrap();
    let (url, shutdown, handle) =
        start_server(&config(), Arc::new(InMemoryStore::new()), cache).await;
    let client = reqwest::Client::new();

    let resp = client.post(&url).json(&batch_a()).send().await.unwrap();
    assert_eq!(resp.status(), 500);
    assert_eq!(json_body(resp).await["error"]["code"], "CACHE_PUBLISH_FAILED");

    let resp = client
        .get(&url)
        .header(SECRET_HEADER, SECRET)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 503);
    assert_eq!(json_body(resp).await["error"]["code"], "CACHE_UNAVAILABLE");

    let base = url.trim_end_matches("/api/v1/predictions");
    let ready = client.get(format!("{base}/readyz")).send().await.unwrap();
    assert_eq!(ready.status(), 503);
    assert_eq!(json_body(ready).await["status"], "unavailable");

    let _ = shutdown.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn health_and_readiness() {
    let (url, shutdown, handle) = start_default().await;
    let base = url.trim_end_matches("/api/v1/predictions");
    let client = reqwest::Client::new();

    let health = client.get(format!("{base}/healthz")).send().await.unwrap();
    assert_eq!(health.status(), 200);
    assert_eq!(json_body(health).await, json!({"status": "ok"}));

    let ready = client.get(format!("{base}/readyz")).send().await.unwrap();
    assert_eq!(ready.status(), 200);
    assert_eq!(
        json_body(ready).await,
        json!({"status": "ready", "cache": "local", "store": "memory"})
    );

    let _ = shutdown.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn request_id_is_generated_or_echoed() {
    let (url, shutdown, handle) = start_default().await;
    let base = url.trim_end_matches("/api/v1/predictions");
    let client = reqwest::Client::new();

    let resp = client.get(format!("{base}/healthz")).send().await.unwrap();
    let generated = resp.headers()["x-request-id"].to_str().unwrap().to_string();
    assert!(uuid::Uuid::parse_str(&generated).is_ok());

    let resp = client
        .get(format!("{base}/healthz"))
        .header("x-request-id", "trace-42")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.headers()["x-request-id"], "trace-42");

    let _ = shutdown.send(());
    let _ = handle.await;
}
