use sha2::{Digest, Sha256};
use url::Url;

/// Derive the pseudo-identity of a visitor.
///
/// Formula: `hex(sha256(ip ++ user_agent))`, a 64-character lowercase digest.
/// The two inputs are concatenated with no separator; changing that changes
/// every identity ever derived. The result is used verbatim as both `ip_hash`
/// and `visitor_id`, and the raw address is dropped by the caller.
pub fn hash_identity(ip: &str, user_agent: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(ip.as_bytes());
    hasher.update(user_agent.as_bytes());
    hex::encode(hasher.finalize())
}

/// Pull a search keyword out of a referrer URL.
///
/// Looks at the first `q` value, then the first `p` value, returning the
/// first that is non-empty. Empty or unparsable referrers yield `""`.
pub fn extract_keyword(referrer: &str) -> String {
    if referrer.is_empty() {
        return String::new();
    }
    let Ok(url) = Url::parse(referrer) else {
        return String::new();
    };
    // Only the first occurrence of each parameter counts, even when empty.
    for name in ["q", "p"] {
        let value = url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
            .unwrap_or_default();
        if !value.is_empty() {
            return value;
        }
    }
    String::new()
}
