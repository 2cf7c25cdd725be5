use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::debug;

use crate::{
    ingest::{enrich, header_str, transport_ip, MaybeConnectInfo, Visit},
    state::AppState,
};

const TRANSPARENT_GIF: &[u8] = &[
    71, 73, 70, 56, 57, 97, 1, 0, 1, 0, 128, 0, 0, 0, 0, 0, 255, 255, 255, 33, 249, 4, 1, 0, 0, 0,
    0, 44, 0, 0, 0, 0, 1, 0, 1, 0, 0, 2, 2, 68, 1, 0, 59,
];

const UNKNOWN: &str = "unknown";

#[derive(Debug, Default, Deserialize)]
pub struct NoscriptQuery {
    /// Referrer of the page embedding the pixel.
    pub r: Option<String>,
}

fn pixel() -> Response {
    (
        [
            (header::CONTENT_TYPE, "image/gif"),
            (header::CACHE_CONTROL, "no-store, no-cache, must-revalidate"),
            (header::PRAGMA, "no-cache"),
            (header::EXPIRES, "0"),
        ],
        TRANSPARENT_GIF,
    )
        .into_response()
}

/// `GET /api/track-noscript`: tracking pixel for clients without script.
///
/// Always answers `200` with a 1x1 GIF. Requests over the rate limit or
/// without a registered `Referer` are dropped silently. Recorded events are
/// flagged `is_bot`.
#[tracing::instrument(skip_all)]
pub async fn track_noscript(
    State(state): State<Arc<AppState>>,
    MaybeConnectInfo(peer): MaybeConnectInfo,
    headers: HeaderMap,
    query: Result<Query<NoscriptQuery>, QueryRejection>,
) -> Response {
    let ip = transport_ip(&headers, peer, state.config.trust_proxy).unwrap_or_default();
    if !state.rate_limiter.check(&ip).await {
        debug!("Rate limit exceeded on pixel endpoint");
        return pixel();
    }
    let Some(current_url) = header_str(&headers, header::REFERER).map(str::to_string) else {
        debug!("Pixel request without Referer");
        return pixel();
    };
    let Some(website) = state.authorized_website(&current_url).await else {
        debug!(current_url = %current_url, "Pixel request for unregistered domain");
        return pixel();
    };

    let referrer = query.map(|Query(q)| q.r).ok().flatten().unwrap_or_default();
    let event = enrich(Visit {
        website_id: Some(website.id),
        ip,
        user_agent: header_str(&headers, header::USER_AGENT)
            .unwrap_or_default()
            .to_string(),
        current_url,
        referrer,
        screen_resolution: UNKNOWN.to_string(),
        country: UNKNOWN.to_string(),
        country_code: UNKNOWN.to_string(),
        is_bot: true,
    });
    state.record(event).await;

    pixel()
}
