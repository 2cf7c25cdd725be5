use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use tally_core::config::Config;
use tally_duckdb::DuckDbBackend;
use tally_server::app::build_app;
use tally_server::state::AppState;

fn setup() -> axum::Router {
    let db = DuckDbBackend::open_in_memory().expect("in-memory DuckDB");
    let config = Config {
        public_url: "https://stats.acme.test".to_string(),
        ..Config::default()
    };
    build_app(Arc::new(AppState::new(Arc::new(db), config)))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("build request")
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("build request")
}

async fn json_body(response: axum::http::Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("parse JSON")
}

#[tokio::test]
async fn test_create_website_returns_snippet() {
    let app = setup();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/websites",
            json!({ "name": "acme", "url": "https://acme.test" }),
        ))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = json_body(response).await;
    let data = &json["data"];
    let id = data["id"].as_str().expect("id");
    assert!(id.starts_with("site_"));
    assert_eq!(id.len(), 15);
    assert_eq!(data["name"], "acme");
    assert_eq!(data["url"], "https://acme.test");
    let snippet = data["tracking_snippet"].as_str().expect("snippet");
    assert!(snippet.contains("https://stats.acme.test/static/js/tracker.js"));
    assert!(snippet.contains("https://stats.acme.test/api/track-noscript"));
}

#[tokio::test]
async fn test_create_website_validates_input() {
    let app = setup();

    for body in [
        json!({ "url": "https://acme.test" }),
        json!({ "name": "   ", "url": "https://acme.test" }),
        json!({ "name": "acme" }),
        json!({ "name": "acme", "url": "/pricing" }),
    ] {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/websites", body.clone()))
            .await
            .expect("request");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {body}");
        let json = json_body(response).await;
        assert_eq!(json["error"]["code"], "validation_error");
    }
}

#[tokio::test]
async fn test_registered_website_authorizes_tracking_immediately() {
    let app = setup();

    let track = || {
        json_request(
            "POST",
            "/api/track",
            json!({ "current_url": "https://acme.test/landing" }),
        )
    };
    let response = app.clone().oneshot(track()).await.expect("request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/websites",
            json!({ "name": "acme", "url": "acme.test" }),
        ))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app.oneshot(track()).await.expect("request");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_list_and_delete_website() {
    let app = setup();

    let created = json_body(
        app.clone()
            .oneshot(json_request(
                "POST",
                "/api/websites",
                json!({ "name": "acme", "url": "https://acme.test" }),
            ))
            .await
            .expect("request"),
    )
    .await;
    let id = created["data"]["id"].as_str().expect("id").to_string();

    let listed = json_body(
        app.clone()
            .oneshot(empty_request("GET", "/api/websites"))
            .await
            .expect("request"),
    )
    .await;
    let websites = listed["data"].as_array().expect("websites");
    assert_eq!(websites.len(), 1);
    assert_eq!(websites[0]["id"], id.as_str());

    let uri = format!("/api/websites/{id}");
    let response = app
        .clone()
        .oneshot(empty_request("DELETE", &uri))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(empty_request("DELETE", &uri))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let listed = json_body(
        app.oneshot(empty_request("GET", "/api/websites"))
            .await
            .expect("request"),
    )
    .await;
    assert_eq!(listed["data"], json!([]));
}
