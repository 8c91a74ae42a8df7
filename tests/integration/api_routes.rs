//! Status codes and bodies of the reading store API, driven in-process.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use potlog::api;
use potlog::store::ReadingStore;
use regex::Regex;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use crate::common::{absent_store_path, fresh_store, init_test_logging};

const TIMESTAMP_PATTERN: &str = r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{6}$";

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| panic!("non-JSON body: {}", String::from_utf8_lossy(&bytes)))
    };
    (status, body)
}

fn post_json(body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/readings")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_latest() -> Request<Body> {
    Request::builder()
        .uri("/api/readings/latest")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn append_returns_created_with_logged_data() {
    init_test_logging();
    let (_dir, store) = fresh_store();
    let app = api::router(store.clone());

    let (status, body) = send(&app, post_json(r#"{"value": 512}"#)).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Data logged");
    assert_eq!(body["logged_data"]["pot_value"], 512);
    let timestamp = body["logged_data"]["timestamp"].as_str().unwrap();
    assert!(Regex::new(TIMESTAMP_PATTERN).unwrap().is_match(timestamp), "{timestamp}");
    assert_eq!(store.count().unwrap(), 1);
}

#[tokio::test]
async fn latest_on_empty_store_is_not_found() {
    let (_dir, store) = fresh_store();
    let app = api::router(store);

    let (status, body) = send(&app, get_latest()).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "No data available"}));
}

#[tokio::test]
async fn latest_returns_the_last_append() {
    let (_dir, store) = fresh_store();
    let app = api::router(store);

    let mut stamps = Vec::new();
    for value in [100, 200, 300] {
        let (status, created) =
            send(&app, post_json(&json!({ "value": value }).to_string())).await;
        assert_eq!(status, StatusCode::CREATED);
        stamps.push(created["logged_data"]["timestamp"].as_str().unwrap().to_string());
    }
    assert!(
        stamps.windows(2).all(|pair| pair[0] <= pair[1]),
        "timestamps went backwards: {stamps:?}"
    );

    let (status, body) = send(&app, get_latest()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 3);
    assert_eq!(body["pot_value"], 300);
    assert_eq!(body["timestamp"], stamps[2].as_str());
    assert!(Regex::new(TIMESTAMP_PATTERN)
        .unwrap()
        .is_match(body["timestamp"].as_str().unwrap()));
}

#[tokio::test]
async fn latest_echoes_the_append_timestamp() {
    let (_dir, store) = fresh_store();
    let app = api::router(store);

    let (_, created) = send(&app, post_json(r#"{"value": 7}"#)).await;
    let (_, latest) = send(&app, get_latest()).await;

    assert_eq!(latest["timestamp"], created["logged_data"]["timestamp"]);
}

#[tokio::test]
async fn client_timestamp_and_extra_fields_are_ignored() {
    let (_dir, store) = fresh_store();
    let app = api::router(store);

    let (status, body) = send(
        &app,
        post_json(r#"{"value": 5, "timestamp": "1999-01-01T00:00:00", "unit": "raw"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_ne!(body["logged_data"]["timestamp"], "1999-01-01T00:00:00");
}

#[tokio::test]
async fn body_without_json_content_type_is_rejected() {
    let (_dir, store) = fresh_store();
    let app = api::router(store.clone());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/readings")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(r#"{"value": 1}"#))
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Request must be JSON"}));
    assert_eq!(store.count().unwrap(), 0);
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let (_dir, store) = fresh_store();
    let app = api::router(store.clone());

    let (status, body) = send(&app, post_json(r#"{"value": "#)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Request must be JSON");
    assert_eq!(store.count().unwrap(), 0);
}

#[tokio::test]
async fn bad_values_are_rejected_without_writing() {
    let (_dir, store) = fresh_store();
    let app = api::router(store.clone());
    send(&app, post_json(r#"{"value": 1}"#)).await;

    for body in [
        r#"{}"#,
        r#"{"val": 1}"#,
        r#"{"value": "12"}"#,
        r#"{"value": 12.5}"#,
        r#"{"value": true}"#,
        r#"{"value": null}"#,
        r#"[1, 2]"#,
    ] {
        let (status, response) = send(&app, post_json(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(response["error"], "Missing or invalid 'value' key", "{body}");
    }
    assert_eq!(store.count().unwrap(), 1);
}

#[tokio::test]
async fn missing_store_is_a_server_error() {
    let dir = TempDir::new().unwrap();
    let app = api::router(ReadingStore::new(absent_store_path(&dir)));

    let (status, body) = send(&app, post_json(r#"{"value": 1}"#)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().starts_with("Database error"));

    let (status, _) = send(&app, get_latest()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let (_dir, store) = fresh_store();
    let app = api::router(store);

    let request = Request::builder()
        .uri("/api/readings/first")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
