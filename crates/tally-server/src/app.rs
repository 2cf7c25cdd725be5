use std::sync::Arc;

use axum::{
    routing::{any, delete, get},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{routes, state::AppState};

/// Construct the Axum [`Router`] with all routes and middleware attached.
///
/// `TraceLayer` logs every request. The permissive `CorsLayer` lets the
/// tracking script post from any embedding origin and answers preflights
/// before they reach the handlers.
pub fn build_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/track", any(routes::track::track))
        .route("/api/track-noscript", get(routes::noscript::track_noscript))
        .route("/api/events", get(routes::events::events))
        .route(
            "/api/websites",
            get(routes::websites::list_websites).post(routes::websites::create_website),
        )
        .route("/api/websites/{id}", delete(routes::websites::delete_website))
        .route("/api/stats/chart", get(routes::stats::chart))
        .route("/api/stats/top", get(routes::stats::top))
        .route("/api/stats/sources", get(routes::stats::sources))
        .route("/api/stats/recent", get(routes::stats::recent))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
