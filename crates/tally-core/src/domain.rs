//! Host extraction and ingestion authorization.

use url::Url;

use crate::event::Website;

/// Host component of `raw` with any port removed, case preserved.
///
/// Inputs without an authority (`example.com/page`, `localhost:8080`) fall
/// back to the leading path segment so bare domains still resolve. Returns
/// `None` when nothing host-like remains.
pub fn url_host(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(url) = Url::parse(raw) {
        // `host_str` never includes the port.
        if let Some(host) = url.host_str().filter(|h| !h.is_empty()) {
            return Some(host.to_string());
        }
    }
    let segment = raw.split(['/', '?', '#']).next().unwrap_or_default();
    let host = match segment.split_once(':') {
        Some((host, _port)) => host,
        None => segment,
    };
    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}

/// Lowercased, port-free host used as the authorization key.
pub fn normalized_host(raw: &str) -> Option<String> {
    url_host(raw).map(|h| h.to_ascii_lowercase())
}

/// Return the registered website whose host matches `current_url`, if any.
///
/// Fails closed: an empty or host-less URL never matches, and websites whose
/// own `url` has no host are skipped.
pub fn authorize<'a>(current_url: &str, websites: &'a [Website]) -> Option<&'a Website> {
    let host = normalized_host(current_url)?;
    websites
        .iter()
        .find(|w| normalized_host(&w.url).as_deref() == Some(host.as_str()))
}
