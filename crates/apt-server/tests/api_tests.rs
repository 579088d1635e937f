//! HTTP API tests
//!
//! Exercise the full router with a temporary storage root and a fake
//! registry: upload, download, listing, deletion, reports and authorization.

mod common;

use apt_common::types::RegistryKey;
use apt_server::api::{create_router, AppState};
use apt_server::registry::Reconciler;
use apt_server::storage::DatasetStorage;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use common::{
    config_from, dataset_id, endpoint, page, record, test_env, Call, FakeRegistry, Op, API_KEY,
    PUBLIC_URL, PUBLISHER_KEY,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "apt-test-boundary";
const ARCHIVE: &[u8] = b"PK\x03\x04 fake darwin core archive";

struct TestApp {
    router: Router,
    fake: Arc<FakeRegistry>,
    storage: DatasetStorage,
    _dir: TempDir,
}

async fn setup_with(fake: FakeRegistry, extra_env: &[(&'static str, &str)]) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let mut env = test_env("http://127.0.0.1:9", dir.path());
    for (name, value) in extra_env {
        env.insert(*name, value.to_string());
    }
    let config = config_from(&env);

    let fake = Arc::new(fake);
    let reconciler = Arc::new(Reconciler::new(fake.clone(), PUBLIC_URL, PUBLISHER_KEY));
    reconciler.bootstrap().await.unwrap();

    let storage = DatasetStorage::new(config.storage.clone());
    let router = create_router(AppState::new(config, storage.clone(), reconciler));

    TestApp {
        router,
        fake,
        storage,
        _dir: dir,
    }
}

async fn setup() -> TestApp {
    setup_with(FakeRegistry::new(), &[]).await
}

fn multipart_body(field: &str, filename: &str, data: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/zip\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(id: &str, body: Vec<u8>, api_key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(format!("/dataset/{id}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(key) = api_key {
        builder = builder.header("X-API-Key", key);
    }
    builder.body(Body::from(body)).unwrap()
}

fn upload(id: &str) -> Request<Body> {
    upload_request(id, multipart_body("file", &format!("{id}.zip"), ARCHIVE), Some(API_KEY))
}

fn delete(id: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(format!("/dataset/{id}"))
        .header("X-API-Key", API_KEY)
        .body(Body::empty())
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, request).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

// ============================================================================
// Service endpoints
// ============================================================================

#[tokio::test]
async fn test_root_and_health() {
    let app = setup().await;

    let (status, body) = send_json(&app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["public_url"], PUBLIC_URL);
    assert_eq!(body["publisher_key"], PUBLISHER_KEY);

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

// ============================================================================
// Upload
// ============================================================================

#[tokio::test]
async fn test_upload_registers_and_stores() {
    let app = setup().await;

    let (status, body) = send_json(&app, upload("abc123")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "id": "abc123",
            "url": "https://apt.example.org/dataset/abc123",
            "gbif_key": "key-1",
            "registered": true
        })
    );
    assert_eq!(
        std::fs::read(app.storage.path_for(&dataset_id("abc123"))).unwrap(),
        ARCHIVE
    );
    assert_eq!(app.fake.mutations(), vec![Call::Register(dataset_id("abc123"))]);
}

#[tokio::test]
async fn test_second_upload_triggers_crawl() {
    let app = setup().await;

    send(&app, upload("abc123")).await;
    let (status, body) = send_json(&app, upload("abc123")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["gbif_key"], "key-1");
    assert_eq!(app.fake.count(|c| matches!(c, Call::Register(_))), 1);
    assert_eq!(app.fake.count(|c| matches!(c, Call::Crawl(_))), 1);
}

#[tokio::test]
async fn test_upload_requires_api_key() {
    let app = setup().await;

    let body = multipart_body("file", "abc123.zip", ARCHIVE);
    let (status, response) = send_json(&app, upload_request("abc123", body.clone(), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(response["error"]["code"], "FORBIDDEN");

    let (status, _) = send(&app, upload_request("abc123", body, Some("wrong"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    assert!(!app.storage.exists(&dataset_id("abc123")).await.unwrap());
    assert!(app.fake.mutations().is_empty());
}

#[tokio::test]
async fn test_upload_checks_authorized_ip() {
    let app = setup_with(FakeRegistry::new(), &[("AUTHORIZED_IP", "10.0.0.7")]).await;

    let (status, _) = send(&app, upload("abc123")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let mut request = upload("abc123");
    request
        .headers_mut()
        .insert("X-Real-IP", "10.0.0.7".parse().unwrap());
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_upload_rejects_invalid_id() {
    let app = setup().await;

    let (status, body) = send_json(&app, upload("ab")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(app.fake.mutations().is_empty());
}

#[tokio::test]
async fn test_upload_requires_file_field() {
    let app = setup().await;

    let wrong_field = multipart_body("archive", "abc123.zip", ARCHIVE);
    let (status, _) = send(&app, upload_request("abc123", wrong_field, Some(API_KEY))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let empty_name = multipart_body("file", "", ARCHIVE);
    let (status, _) = send(&app, upload_request("abc123", empty_name, Some(API_KEY))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(!app.storage.exists(&dataset_id("abc123")).await.unwrap());
}

#[tokio::test]
async fn test_upload_registry_failure_keeps_file() {
    let fake = FakeRegistry::new();
    fake.fail(Op::Register);
    let app = setup_with(fake, &[]).await;

    let (status, body) = send_json(&app, upload("abc123")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "REGISTRY_ERROR");
    assert!(app.storage.exists(&dataset_id("abc123")).await.unwrap());

    let (_, report) = send_json(&app, get("/report/registered")).await;
    assert_eq!(report, json!([]));
}

// ============================================================================
// Download and listing
// ============================================================================

#[tokio::test]
async fn test_download() {
    let app = setup().await;
    send(&app, upload("abc123")).await;

    let (status, body) = send(&app, get("/dataset/abc123")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ARCHIVE);

    let (status, _) = send(&app, get("/dataset/zzz999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, get("/dataset/ab")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_datasets() {
    let app = setup().await;
    send(&app, upload("abc123")).await;
    app.storage.save(&dataset_id("local1"), b"not registered").await.unwrap();

    let (status, body) = send_json(&app, get("/dataset")).await;
    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["id"], "abc123");
    assert_eq!(items[0]["url"], "https://apt.example.org/dataset/abc123");
    assert!(items[0].get("registered").is_none());

    let (_, body) = send_json(&app, get("/dataset?gbif=on")).await;
    let items = body.as_array().unwrap();
    assert_eq!(items[0]["gbif_key"], "key-1");
    assert_eq!(items[0]["registered"], true);
    assert_eq!(items[1]["id"], "local1");
    assert_eq!(items[1]["gbif_key"], Value::Null);
    assert_eq!(items[1]["registered"], false);
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn test_delete_published_dataset() {
    let app = setup().await;
    send(&app, upload("abc123")).await;

    let (status, body) = send_json(&app, delete("abc123")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "abc123");
    assert_eq!(body["deleted"], "done");
    assert!(!app.storage.exists(&dataset_id("abc123")).await.unwrap());
    assert_eq!(app.fake.mutations().last(), Some(&Call::Delete(RegistryKey::new("key-1"))));

    let (_, report) = send_json(&app, get("/report/deleted")).await;
    assert_eq!(
        report,
        json!([{"url": "https://apt.example.org/dataset/abc123", "key": "key-1"}])
    );
    let (_, report) = send_json(&app, get("/report/registered")).await;
    assert_eq!(report, json!([]));
}

#[tokio::test]
async fn test_delete_unregistered_file() {
    let app = setup().await;
    app.storage.save(&dataset_id("local1"), b"data").await.unwrap();

    let (status, body) = send_json(&app, delete("local1")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": "local1", "deleted": "done"}));
    assert!(app.fake.mutations().is_empty());
}

#[tokio::test]
async fn test_delete_missing_dataset() {
    let app = setup().await;

    let (status, body) = send_json(&app, delete("zzz999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, _) = send(&app, delete("a")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_registry_failure_keeps_file() {
    let app = setup().await;
    send(&app, upload("abc123")).await;
    app.fake.fail(Op::Delete);

    let (status, _) = send(&app, delete("abc123")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(app.storage.exists(&dataset_id("abc123")).await.unwrap());
}

#[tokio::test]
async fn test_delete_requires_api_key() {
    let app = setup().await;
    send(&app, upload("abc123")).await;

    let request = Request::builder()
        .method("DELETE")
        .uri("/dataset/abc123")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(app.storage.exists(&dataset_id("abc123")).await.unwrap());
}

// ============================================================================
// Reports
// ============================================================================

#[tokio::test]
async fn test_reports_reflect_bootstrap() {
    let fake = FakeRegistry::new()
        .with_published_pages(vec![page(
            vec![record("live-key", Some(PUBLISHER_KEY), &[endpoint("live01").as_str()])],
            true,
        )])
        .with_deleted_pages(vec![page(
            vec![record("gone-key", Some(PUBLISHER_KEY), &[endpoint("gone01").as_str()])],
            true,
        )]);
    let app = setup_with(fake, &[]).await;

    let (status, registered) = send_json(&app, get("/report/registered")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        registered,
        json!([{"url": "https://apt.example.org/dataset/live01", "key": "live-key"}])
    );

    let (_, deleted) = send_json(&app, get("/report/deleted")).await;
    assert_eq!(
        deleted,
        json!([{"url": "https://apt.example.org/dataset/gone01", "key": "gone-key"}])
    );

    // Re-uploading a deleted dataset revives it
    let (status, body) = send_json(&app, upload("gone01")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["gbif_key"], "gone-key");
    let (_, deleted) = send_json(&app, get("/report/deleted")).await;
    assert_eq!(deleted, json!([]));
}
