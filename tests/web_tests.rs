//! HTTP service tests driven through the router without a listener.

mod common;

use amplicount::dictionary::builder::BuildConfig;
use amplicount::web::server::{router, AppState, ServiceConfig};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const TOKEN: &str = "s3cret";

fn app(root: &Path, fixture: &common::Fixture) -> Router {
    app_with_debug(root, fixture, false)
}

fn app_with_debug(root: &Path, fixture: &common::Fixture, debug: bool) -> Router {
    let config = ServiceConfig {
        runs_root: root.to_path_buf(),
        plate_map: fixture.plate_map.clone(),
        amplicon_map: fixture.amplicon_map.clone(),
        seasons: HashMap::from([("winter".to_string(), fixture.amplicon_map.clone())]),
        token: Some(TOKEN.to_string()),
        build: BuildConfig::default(),
        debug,
    };
    router(Arc::new(AppState::new(config)))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

fn post(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Poll a task until it leaves the not-ready state
async fn wait_for(app: &Router, run_id: &str, id: u64) -> serde_json::Value {
    for _ in 0..200 {
        let (status, body) = send(app, get(&format!("/swabseq/{run_id}/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        if body["status"] != "not-ready" {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    serde_json::Value::Null
}

#[tokio::test]
async fn test_health() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = common::write_run(dir.path(), "run1");
    let app = app(dir.path(), &fixture);

    let response = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );

    let (_, json) = send(&app, get("/health")).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_post_requires_token() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = common::write_run(dir.path(), "run1");
    let app = app(dir.path(), &fixture);

    let (status, json) = send(&app, post("/swabseq/run1", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error_type"], "unauthorized");

    let (status, _) = send(&app, post("/swabseq/run1", Some("wrong"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_invalid_requests() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = common::write_run(dir.path(), "run1");
    let app = app(dir.path(), &fixture);

    let (status, json) = send(&app, post("/swabseq/..hidden", Some(TOKEN))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_type"], "invalid_run_id");

    let (status, _) = send(&app, post("/swabseq/run2", Some(TOKEN))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, json) = send(&app, post("/swabseq/run1?season=summer", Some(TOKEN))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_type"], "invalid_season");

    let (status, _) = send(&app, get("/swabseq/run1/42")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_analysis_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = common::write_run(dir.path(), "run1");
    let app = app(dir.path(), &fixture);

    let (status, json) = send(&app, post("/swabseq/run1?season=winter", Some(TOKEN))).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(json["status"], "not-ready");
    let id = json["id"].as_u64().unwrap();

    // Task ids are scoped to their run
    let (status, _) = send(&app, get(&format!("/swabseq/other/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let json = wait_for(&app, "run1", id).await;
    assert_eq!(json["status"], "ready", "{json}");
    assert_eq!(json["run_id"], "run1");

    // Only fully matched combinations are returned as results
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["index1"], "AGGTT");
    assert_eq!(results[0]["count"], 2);

    assert_eq!(json["attachments"]["results.csv"], common::EXPECTED_RESULTS);
    assert!(json["attachments"].get("top_unaligned_i1.csv").is_none());

    // Reports are written to a scratch directory, never into the run
    assert!(!fixture.run_dir.join("results.csv").exists());
}

#[tokio::test]
async fn test_debug_analysis_attaches_unmatched_reports() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = common::write_run(dir.path(), "run1");
    let app = app_with_debug(dir.path(), &fixture, true);

    let (status, json) = send(&app, post("/swabseq/run1", Some(TOKEN))).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let id = json["id"].as_u64().unwrap();

    let json = wait_for(&app, "run1", id).await;
    assert_eq!(json["status"], "ready", "{json}");

    let attachments = &json["attachments"];
    assert_eq!(attachments["results.csv"], common::EXPECTED_RESULTS);
    assert_eq!(attachments["top_unaligned_i1.csv"], "sequence,count\nCCCCC,1\n");
    assert_eq!(attachments["top_unaligned_amps.csv"], "sequence,count\n");
    assert!(attachments["top_unaligned_i2.csv"].is_string());

    assert!(!fixture.run_dir.join("top_unaligned_i1.csv").exists());
}

#[tokio::test]
async fn test_concurrent_analyses_of_one_run() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = common::write_run(dir.path(), "run1");
    let app = app_with_debug(dir.path(), &fixture, true);

    let mut ids = Vec::new();
    for _ in 0..4 {
        let (status, json) = send(&app, post("/swabseq/run1", Some(TOKEN))).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        ids.push(json["id"].as_u64().unwrap());
    }

    for id in ids {
        let json = wait_for(&app, "run1", id).await;
        assert_eq!(json["status"], "ready", "{json}");
        assert_eq!(json["attachments"]["results.csv"], common::EXPECTED_RESULTS);
    }
    assert!(!fixture.run_dir.join("results.csv").exists());
}

#[tokio::test]
async fn test_preflight_needs_no_token() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = common::write_run(dir.path(), "run1");
    let app = app(dir.path(), &fixture);

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/swabseq/run1")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_ne!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .method("DELETE")
        .uri("/swabseq/run1")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_failed_analysis_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = common::write_run(dir.path(), "run1");
    std::fs::remove_file(fixture.run_dir.join("RunParameters.xml")).unwrap();
    let app = app(dir.path(), &fixture);

    let (_, json) = send(&app, post("/swabseq/run1", Some(TOKEN))).await;
    let id = json["id"].as_u64().unwrap();

    let json = wait_for(&app, "run1", id).await;
    assert_eq!(json["status"], "failed");
    // Internal paths are never echoed to clients
    assert_eq!(json["error"], "Analysis failed");
}
