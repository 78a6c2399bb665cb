//! HTTP route tests
//!
//! The pool points at a closed port, so `/health` exercises the unavailable
//! path without a running database.

mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use common::{reading, Harness};
use reading_etl_server::api::{self, AppState};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tower::ServiceExt; // for `oneshot`

fn app(h: &Harness) -> Router {
    let db = PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(200))
        .connect_lazy("postgresql://nobody@127.0.0.1:1/none")
        .unwrap();

    api::router(AppState {
        db,
        sync: Arc::new(h.service()),
    })
}

async fn send(app: Router, method: Method, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_root() {
    let (status, body) = send(app(&Harness::new()), Method::GET, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Welcome to the Observability Hub." }));
}

#[tokio::test]
async fn test_reading_placeholder() {
    let (status, body) = send(app(&Harness::new()), Method::GET, "/api/reading").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "placeholder": "reading placeholder still" }));
}

#[tokio::test]
async fn test_sync_route_success() {
    let h = Harness::new();
    h.docs.insert(reading("r1")).await;
    h.docs.insert(reading("r2")).await;

    let (status, body) = send(app(&h), Method::POST, "/api/sync/reading").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "status": "success",
            "processed_count": 2,
            "failed_count": 0,
            "failed_ids": []
        })
    );
    assert_eq!(h.docs.pending_count().await, 0);
}

#[tokio::test]
async fn test_sync_route_accepts_get() {
    let h = Harness::new();
    let (status, body) = send(app(&h), Method::GET, "/api/sync/reading").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["processed_count"], 0);
}

#[tokio::test]
async fn test_sync_route_error_outcome() {
    let h = Harness::new();
    h.docs.fail_queries(true).await;

    let (status, body) = send(app(&h), Method::POST, "/api/sync/reading").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "error");
    assert!(body.get("processed_count").is_none());
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("failed to query pending documents"));
}

#[tokio::test]
async fn test_health_reports_unavailable_database() {
    let (status, body) = send(app(&Harness::new()), Method::GET, "/health").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["status"], 503);
}

#[tokio::test]
async fn test_unknown_route() {
    let (status, body) = send(app(&Harness::new()), Method::GET, "/api/nope").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "no route for /api/nope");
}
