//! Enrichment shared by the script and pixel endpoints.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use chrono::{SubsecRound, Utc};

use tally_core::{
    event::Event,
    user_agent::classify,
    visitor::{extract_keyword, hash_identity},
};

/// Remote socket address when the server runs with connect-info enabled.
///
/// `oneshot`-driven tests have no socket, so this never rejects.
pub struct MaybeConnectInfo(pub Option<SocketAddr>);

impl<S: Send + Sync> FromRequestParts<S> for MaybeConnectInfo {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| *addr),
        ))
    }
}

/// Address of the client as seen by the transport.
///
/// With `trust_proxy` the first `X-Forwarded-For` entry wins; otherwise only
/// the socket peer counts. `None` when neither is available.
pub fn transport_ip(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy: bool) -> Option<String> {
    let forwarded = trust_proxy
        .then(|| {
            headers
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.split(',').next())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
        .flatten();
    forwarded.or_else(|| peer.map(|addr| addr.ip().to_string()))
}

pub fn header_str<'a>(headers: &'a HeaderMap, name: header::HeaderName) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
}

/// Everything an endpoint knows about one page view before enrichment.
///
/// `ip` is consumed by the hasher and goes no further.
#[derive(Debug, Clone, Default)]
pub struct Visit {
    pub website_id: Option<String>,
    pub ip: String,
    pub user_agent: String,
    pub current_url: String,
    pub referrer: String,
    pub screen_resolution: String,
    pub country: String,
    pub country_code: String,
    pub is_bot: bool,
}

/// Stamp, classify and hash a visit into a storable [`Event`].
///
/// The timestamp is the server clock truncated to microseconds, which is the
/// store's precision, so a published event equals its stored copy.
pub fn enrich(visit: Visit) -> Event {
    let ua = classify(&visit.user_agent);
    let identity = hash_identity(&visit.ip, &visit.user_agent);
    Event {
        website_id: visit.website_id,
        timestamp: Utc::now().trunc_subsecs(6),
        visitor_id: identity.clone(),
        ip_hash: identity,
        keyword: extract_keyword(&visit.referrer),
        country: visit.country,
        country_code: visit.country_code,
        user_agent: visit.user_agent,
        screen_resolution: visit.screen_resolution,
        referrer: visit.referrer,
        current_url: visit.current_url,
        is_bot: visit.is_bot,
        os: ua.os.as_str().to_string(),
        browser: ua.browser.as_str().to_string(),
        device: ua.device.as_str().to_string(),
    }
}
