//! Tests for the registry client against a local HTTP backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use pushline_core::config::RegistryConfig;
use pushline_core::types::{PushSubscription, Validation};
use pushline_core::Error;
use serde_json::{Value, json};

use super::client::RegistryClient;
use crate::lifecycle::SubscriptionRegistry;

const SERVER_KEY: &str = "BEl62iUYgUivxIkv69yViEuiBIa-Ib9-SkvMeAtA3LFgDzkrxZJjSgSnfckjBJuBkr3qBUYIHBQFLXYp5Nksh8U";

// =============================================================================
// Client construction tests
// =============================================================================

fn config(base_url: &str) -> RegistryConfig {
    RegistryConfig {
        base_url: base_url.to_string(),
        ..RegistryConfig::default()
    }
}

#[test]
fn empty_base_url_returns_config_error() {
    let err = RegistryClient::new(&config("")).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn invalid_token_returns_config_error() {
    let cfg = RegistryConfig {
        token: Some("bad\ntoken".into()),
        ..config("http://127.0.0.1:8000")
    };
    let err = RegistryClient::new(&cfg).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn trailing_slash_stripped_from_base_url() {
    let client = RegistryClient::new(&config("http://127.0.0.1:8000/")).unwrap();
    assert_eq!(
        client.url("/api/notifications/subscribe/"),
        "http://127.0.0.1:8000/api/notifications/subscribe/"
    );
}

#[test]
fn relative_paths_get_leading_slash() {
    let cfg = RegistryConfig {
        key_path: "keys/".into(),
        ..config("http://127.0.0.1:8000")
    };
    assert!(RegistryClient::new(&cfg).is_ok());
}

// =============================================================================
// Local backend
// =============================================================================

#[derive(Debug, Default)]
struct Backend {
    records: Vec<Value>,
    auth_headers: Vec<Option<String>>,
    test_requests: Vec<Value>,
}

type Shared = Arc<Mutex<Backend>>;

fn note_auth(backend: &Shared, headers: &HeaderMap) {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    backend.lock().unwrap().auth_headers.push(auth);
}

async fn server_key(State(backend): State<Shared>, headers: HeaderMap) -> Json<Value> {
    note_auth(&backend, &headers);
    Json(json!({ "public_key": SERVER_KEY }))
}

async fn subscribe(
    State(backend): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    note_auth(&backend, &headers);
    let sub = &body["subscription"];
    let endpoint = sub["endpoint"].as_str().unwrap_or_default().to_string();
    let mut guard = backend.lock().unwrap();
    let position = guard
        .records
        .iter()
        .position(|r| r["endpoint"] == endpoint.as_str());
    let (status, id) = if let Some(i) = position {
        guard.records[i]["keys"] = sub["keys"].clone();
        (StatusCode::OK, guard.records[i]["id"].as_u64().unwrap_or(0))
    } else {
        let id = guard.records.len() as u64 + 1;
        guard.records.push(json!({
            "id": id,
            "endpoint": endpoint,
            "keys": sub["keys"].clone(),
            "created_at": "2026-01-02T03:04:05Z",
        }));
        (StatusCode::CREATED, id)
    };
    (
        status,
        Json(json!({ "message": "Subscription saved", "subscription_id": id })),
    )
}

const PAGE_SIZE: usize = 2;

/// Page-number pagination with absolute `next`/`previous` links.
async fn list(
    State(backend): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let page: usize = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let host = headers
        .get("host")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let link = |n: usize| format!("http://{host}/api/notifications/subscribe/?page={n}");

    let guard = backend.lock().unwrap();
    backend_page(&guard.records, page, link)
}

fn backend_page(records: &[Value], page: usize, link: impl Fn(usize) -> String) -> Json<Value> {
    let start = page.saturating_sub(1) * PAGE_SIZE;
    let results: Vec<Value> = records.iter().skip(start).take(PAGE_SIZE).cloned().collect();
    let next = (start + PAGE_SIZE < records.len()).then(|| link(page + 1));
    let previous = (page > 1).then(|| link(page - 1));
    Json(json!({
        "count": records.len(),
        "next": next,
        "previous": previous,
        "results": results,
    }))
}

async fn unsubscribe(
    State(backend): State<Shared>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let endpoint = body["subscription"]["endpoint"].clone();
    let mut guard = backend.lock().unwrap();
    let before = guard.records.len();
    guard.records.retain(|r| r["endpoint"] != endpoint);
    if guard.records.len() == before {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Subscription not found" })),
        );
    }
    (StatusCode::OK, Json(json!({ "message": "Unsubscribed" })))
}

async fn test_push(State(backend): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    let mut guard = backend.lock().unwrap();
    guard.test_requests.push(body);
    let count = guard.records.len();
    Json(json!({
        "message": format!("Test notification sent to {count} device(s)"),
        "success_count": count,
        "failed_count": 0,
        "remaining_subscriptions": count,
    }))
}

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn backend() -> (Shared, String) {
    let shared = Shared::default();
    let app = Router::new()
        .route("/api/notifications/vapid-key/", get(server_key))
        .route("/api/notifications/subscribe/", post(subscribe).get(list))
        .route("/api/notifications/unsubscribe/", post(unsubscribe))
        .route("/api/notifications/test/", post(test_push))
        .with_state(Arc::clone(&shared));
    (shared, spawn(app).await)
}

fn subscription(endpoint: &str) -> PushSubscription {
    PushSubscription::new(endpoint, "BPk-key", "c2VjcmV0")
}

// =============================================================================
// Registry operations
// =============================================================================

#[tokio::test]
async fn fetches_server_key() {
    let (_, url) = backend().await;
    let client = RegistryClient::new(&config(&url)).unwrap();

    assert_eq!(client.fetch_server_key().await.unwrap(), SERVER_KEY);
}

#[tokio::test]
async fn bearer_token_is_sent_when_configured() {
    let (shared, url) = backend().await;
    let cfg = RegistryConfig {
        token: Some("tok-123".into()),
        ..config(&url)
    };
    let client = RegistryClient::new(&cfg).unwrap();

    client.fetch_server_key().await.unwrap();

    let auth = shared.lock().unwrap().auth_headers.clone();
    assert_eq!(auth, vec![Some("Bearer tok-123".to_string())]);
}

#[tokio::test]
async fn no_token_sends_no_authorization() {
    let (shared, url) = backend().await;
    let client = RegistryClient::new(&config(&url)).unwrap();

    client.fetch_server_key().await.unwrap();

    assert_eq!(shared.lock().unwrap().auth_headers, vec![None]);
}

#[tokio::test]
async fn register_sends_envelope_and_upserts() {
    let (shared, url) = backend().await;
    let client = RegistryClient::new(&config(&url)).unwrap();

    let first = client
        .register_subscription(&subscription("https://push.example/a"))
        .await
        .unwrap();
    let mut rotated = subscription("https://push.example/a");
    rotated.keys.auth = "bmV3c2VjcmV0".into();
    let second = client.register_subscription(&rotated).await.unwrap();

    assert_eq!(first, second);
    let records = shared.lock().unwrap().records.clone();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["keys"]["p256dh"], "BPk-key");
    assert_eq!(records[0]["keys"]["auth"], "bmV3c2VjcmV0");
}

#[tokio::test]
async fn list_parses_records() {
    let (_, url) = backend().await;
    let client = RegistryClient::new(&config(&url)).unwrap();
    client
        .register_subscription(&subscription("https://push.example/a"))
        .await
        .unwrap();

    let records = client.list_subscriptions().await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, 1);
    assert_eq!(records[0].endpoint, "https://push.example/a");
    assert_eq!(records[0].keys.auth, "c2VjcmV0");
}

#[tokio::test]
async fn validate_reports_valid_and_expired() {
    let (_, url) = backend().await;
    let client = RegistryClient::new(&config(&url)).unwrap();
    client
        .register_subscription(&subscription("https://push.example/a"))
        .await
        .unwrap();

    assert_eq!(
        client.validate_subscription("https://push.example/a").await,
        Validation::Valid
    );
    assert_eq!(
        client.validate_subscription("https://push.example/b").await,
        Validation::Expired
    );
}

#[tokio::test]
async fn list_follows_next_across_pages() {
    let (_, url) = backend().await;
    let client = RegistryClient::new(&config(&url)).unwrap();
    for endpoint in ["a", "b", "c"] {
        client
            .register_subscription(&subscription(&format!("https://push.example/{endpoint}")))
            .await
            .unwrap();
    }

    let records = client.list_subscriptions().await.unwrap();

    let ids: Vec<u64> = records.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    // The third record only appears on the second page.
    assert_eq!(
        client.validate_subscription("https://push.example/c").await,
        Validation::Valid
    );
    assert_eq!(
        client.validate_subscription("https://push.example/d").await,
        Validation::Expired
    );
}

#[tokio::test]
async fn list_resolves_relative_next_links() {
    let app = Router::new().route(
        "/api/notifications/subscribe/",
        get(|Query(params): Query<HashMap<String, String>>| async move {
            let record = |id: u64| {
                json!({
                    "id": id,
                    "endpoint": format!("https://push.example/{id}"),
                    "keys": { "p256dh": "k", "auth": "a" },
                    "created_at": "2026-01-02T03:04:05Z",
                })
            };
            if params.get("page").map(String::as_str) == Some("2") {
                Json(json!({ "count": 2, "next": null, "results": [record(2)] }))
            } else {
                Json(json!({
                    "count": 2,
                    "next": "/api/notifications/subscribe/?page=2",
                    "results": [record(1)],
                }))
            }
        }),
    );
    let url = spawn(app).await;
    let client = RegistryClient::new(&config(&url)).unwrap();

    let records = client.list_subscriptions().await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[1].endpoint, "https://push.example/2");
}

#[tokio::test]
async fn list_stops_when_next_repeats() {
    let app = Router::new().route(
        "/api/notifications/subscribe/",
        get(|| async {
            Json(json!({
                "count": 1,
                "next": "/api/notifications/subscribe/",
                "results": [{
                    "id": 1,
                    "endpoint": "https://push.example/1",
                    "keys": { "p256dh": "k", "auth": "a" },
                    "created_at": "2026-01-02T03:04:05Z",
                }],
            }))
        }),
    );
    let url = spawn(app).await;
    let client = RegistryClient::new(&config(&url)).unwrap();

    let records = client.list_subscriptions().await.unwrap();

    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn list_accepts_unpaginated_array() {
    let app = Router::new().route(
        "/api/notifications/subscribe/",
        get(|| async {
            Json(json!([{
                "id": 4,
                "endpoint": "https://push.example/4",
                "keys": { "p256dh": "k", "auth": "a" },
                "created_at": "2026-01-02T03:04:05Z",
            }]))
        }),
    );
    let url = spawn(app).await;
    let client = RegistryClient::new(&config(&url)).unwrap();

    let records = client.list_subscriptions().await.unwrap();

    assert_eq!(records[0].id, 4);
}

#[tokio::test]
async fn validate_is_unknown_when_unreachable() {
    // Bind and release a port so nothing is listening on it.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = RegistryClient::new(&config(&format!("http://{addr}"))).unwrap();

    assert_eq!(
        client.validate_subscription("https://push.example/a").await,
        Validation::Unknown
    );
    assert!(matches!(
        client.fetch_server_key().await,
        Err(Error::Request(_))
    ));
}

#[tokio::test]
async fn delete_removes_record_and_tolerates_missing() {
    let (shared, url) = backend().await;
    let client = RegistryClient::new(&config(&url)).unwrap();
    let sub = subscription("https://push.example/a");
    client.register_subscription(&sub).await.unwrap();

    client.delete_subscription(&sub).await.unwrap();
    assert!(shared.lock().unwrap().records.is_empty());

    // Second delete hits the 404 path.
    client.delete_subscription(&sub).await.unwrap();
}

#[tokio::test]
async fn send_test_reports_counts() {
    let (shared, url) = backend().await;
    let client = RegistryClient::new(&config(&url)).unwrap();
    client
        .register_subscription(&subscription("https://push.example/a"))
        .await
        .unwrap();

    let report = client.send_test("Hello", "World").await.unwrap();

    assert_eq!(report.success_count, 1);
    assert_eq!(report.failed_count, 0);
    assert_eq!(report.remaining_subscriptions, Some(1));
    let sent = shared.lock().unwrap().test_requests.clone();
    assert_eq!(sent, vec![json!({ "title": "Hello", "body": "World" })]);
}

// =============================================================================
// Status mapping
// =============================================================================

#[tokio::test]
async fn gone_maps_to_subscription_expired() {
    let app = Router::new().route(
        "/api/notifications/subscribe/",
        post(|| async { StatusCode::GONE }),
    );
    let url = spawn(app).await;
    let client = RegistryClient::new(&config(&url)).unwrap();

    let err = client
        .register_subscription(&subscription("https://push.example/a"))
        .await
        .unwrap_err();

    assert!(
        matches!(&err, Error::SubscriptionExpired { endpoint } if endpoint == "https://push.example/a"),
        "got {err:?}"
    );
}

#[tokio::test]
async fn error_body_message_is_surfaced() {
    let app = Router::new().route(
        "/api/notifications/vapid-key/",
        get(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "VAPID public key not configured" })),
            )
        }),
    );
    let url = spawn(app).await;
    let client = RegistryClient::new(&config(&url)).unwrap();

    let err = client.fetch_server_key().await.unwrap_err();

    assert!(
        matches!(&err, Error::Registry { status: 500, message } if message == "VAPID public key not configured"),
        "got {err:?}"
    );
}

#[tokio::test]
async fn non_json_error_uses_reason_phrase() {
    let app = Router::new().route(
        "/api/notifications/vapid-key/",
        get(|| async { (StatusCode::UNAUTHORIZED, "nope") }),
    );
    let url = spawn(app).await;
    let client = RegistryClient::new(&config(&url)).unwrap();

    let err = client.fetch_server_key().await.unwrap_err();

    assert!(
        matches!(&err, Error::Registry { status: 401, message } if message == "Unauthorized"),
        "got {err:?}"
    );
}
