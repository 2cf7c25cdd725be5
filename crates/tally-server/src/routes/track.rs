use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode},
};
use tracing::warn;

use tally_core::event::TrackPayload;

use crate::{
    error::AppError,
    ingest::{enrich, header_str, transport_ip, MaybeConnectInfo, Visit},
    state::AppState,
};

/// `POST /api/track`: ingest one page view from the tracking script.
///
/// The body is decoded as JSON whatever the `Content-Type`, since beacon
/// clients post `text/plain`. `OPTIONS` answers `200` for preflights that
/// reach the handler; every other method is `405`.
///
/// The client address comes from the connection (or `X-Forwarded-For` when
/// the proxy is trusted). The body's `ip` field is used only when neither is
/// available. The `User-Agent` header beats the body's `user_agent`. The
/// event is filed under the website `current_url` matched; a `website_id` in
/// the body is ignored.
///
/// ## Response
/// `204` on success, `400` for an undecodable body, `429` when the client
/// address is over its rate limit, `403` when `current_url` belongs to no
/// registered website. A failed insert still answers `204`.
#[tracing::instrument(skip_all)]
pub async fn track(
    State(state): State<Arc<AppState>>,
    method: Method,
    MaybeConnectInfo(peer): MaybeConnectInfo,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    if method == Method::OPTIONS {
        return Ok(StatusCode::OK);
    }
    if method != Method::POST {
        return Err(AppError::MethodNotAllowed);
    }

    let payload: TrackPayload = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("invalid JSON body: {e}")))?;

    let ip = transport_ip(&headers, peer, state.config.trust_proxy)
        .or(payload.ip)
        .unwrap_or_default();
    if !state.rate_limiter.check(&ip).await {
        warn!("Rate limit exceeded on track endpoint");
        return Err(AppError::TooManyRequests);
    }

    let current_url = payload.current_url.unwrap_or_default();
    let Some(website) = state.authorized_website(&current_url).await else {
        warn!(current_url = %current_url, "Rejected event for unregistered domain");
        return Err(AppError::Forbidden("domain is not registered".to_string()));
    };
    let user_agent = header_str(&headers, header::USER_AGENT)
        .map(str::to_string)
        .or(payload.user_agent)
        .unwrap_or_default();

    let event = enrich(Visit {
        website_id: Some(website.id),
        ip,
        user_agent,
        current_url,
        referrer: payload.referrer.unwrap_or_default(),
        screen_resolution: payload.screen_resolution.unwrap_or_default(),
        country: payload.country.unwrap_or_default(),
        country_code: payload.country_code.unwrap_or_default(),
        is_bot: false,
    });
    state.record(event).await;

    Ok(StatusCode::NO_CONTENT)
}
