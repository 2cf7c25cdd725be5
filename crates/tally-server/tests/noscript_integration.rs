use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use tally_core::analytics::EventStore;
use tally_core::config::Config;
use tally_core::visitor::hash_identity;
use tally_duckdb::DuckDbBackend;
use tally_server::app::build_app;
use tally_server::state::AppState;

const CURL: &str = "curl/8.4.0";

async fn setup_with(config: Config) -> (Arc<DuckDbBackend>, axum::Router) {
    let db = Arc::new(DuckDbBackend::open_in_memory().expect("in-memory DuckDB"));
    db.seed_website("site_acme", "https://acme.test")
        .await
        .expect("seed website");
    let state = Arc::new(AppState::new(db.clone(), config));
    (db, build_app(state))
}

async fn setup() -> (Arc<DuckDbBackend>, axum::Router) {
    setup_with(Config::default()).await
}

fn pixel_request(uri: &str, referer: Option<&str>) -> Request<Body> {
    pixel_request_from(uri, referer, [203, 0, 113, 9])
}

fn pixel_request_from(uri: &str, referer: Option<&str>, peer: [u8; 4]) -> Request<Body> {
    let mut builder = Request::builder()
        .method("GET")
        .uri(uri)
        .header("user-agent", CURL);
    if let Some(referer) = referer {
        builder = builder.header("referer", referer);
    }
    let mut request = builder.body(Body::empty()).expect("build request");
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from((peer, 40000))));
    request
}

async fn assert_pixel(response: axum::http::Response<Body>) {
    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers.get("content-type").expect("content-type"), "image/gif");
    assert_eq!(
        headers.get("cache-control").expect("cache-control"),
        "no-store, no-cache, must-revalidate"
    );
    assert_eq!(headers.get("pragma").expect("pragma"), "no-cache");
    assert_eq!(headers.get("expires").expect("expires"), "0");
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    assert_eq!(bytes.len(), 43);
    assert!(bytes.starts_with(b"GIF89a"));
}

#[tokio::test]
async fn test_pixel_records_bot_event_for_registered_referer() {
    let (db, app) = setup().await;

    let request = pixel_request(
        "/api/track-noscript?r=https%3A%2F%2Fsearch.example%2F%3Fp%3Dwidgets",
        Some("https://acme.test/blog/post"),
    );
    assert_pixel(app.oneshot(request).await.expect("request")).await;

    let events = db.recent_events(10).await.expect("recent");
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert!(event.is_bot);
    assert_eq!(event.website_id.as_deref(), Some("site_acme"));
    assert_eq!(event.current_url, "https://acme.test/blog/post");
    assert_eq!(event.referrer, "https://search.example/?p=widgets");
    assert_eq!(event.keyword, "widgets");
    assert_eq!(event.screen_resolution, "unknown");
    assert_eq!(event.country, "unknown");
    assert_eq!(event.country_code, "unknown");
    assert_eq!(event.ip_hash, hash_identity("203.0.113.9", CURL));
    assert_eq!(event.visitor_id, event.ip_hash);
    assert_eq!(event.browser, "Other");
}

#[tokio::test]
async fn test_pixel_unregistered_domain_still_returns_image() {
    let (db, app) = setup().await;

    let request = pixel_request("/api/track-noscript", Some("https://other.test/"));
    assert_pixel(app.oneshot(request).await.expect("request")).await;

    assert!(db.recent_events(10).await.expect("recent").is_empty());
}

#[tokio::test]
async fn test_pixel_without_referer_still_returns_image() {
    let (db, app) = setup().await;

    let request = pixel_request("/api/track-noscript", None);
    assert_pixel(app.oneshot(request).await.expect("request")).await;

    assert!(db.recent_events(10).await.expect("recent").is_empty());
}

#[tokio::test]
async fn test_pixel_ignores_malformed_query() {
    let (db, app) = setup().await;

    let request = pixel_request("/api/track-noscript?r=a&r=b", Some("https://acme.test/"));
    assert_pixel(app.oneshot(request).await.expect("request")).await;

    assert_eq!(db.recent_events(10).await.expect("recent").len(), 1);
}

#[tokio::test]
async fn test_pixel_over_rate_limit_returns_image_without_recording() {
    let config = Config {
        rate_limit_max: 1,
        ..Config::default()
    };
    let (db, app) = setup_with(config).await;

    for _ in 0..3 {
        let request = pixel_request("/api/track-noscript", Some("https://acme.test/"));
        assert_pixel(app.clone().oneshot(request).await.expect("request")).await;
    }
    assert_eq!(db.recent_events(10).await.expect("recent").len(), 1);

    let request = pixel_request_from(
        "/api/track-noscript",
        Some("https://acme.test/"),
        [198, 51, 100, 20],
    );
    assert_pixel(app.oneshot(request).await.expect("request")).await;
    assert_eq!(db.recent_events(10).await.expect("recent").len(), 2);
}
