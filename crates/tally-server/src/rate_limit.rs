//! Per-client sliding-window limit on the ingestion endpoints.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use tally_core::visitor::hash_identity;

/// Past this many tracked clients, idle entries are swept on the next check.
const SWEEP_THRESHOLD: usize = 10_000;

/// Sliding-window request counter keyed by client address.
///
/// Addresses are stored as SHA-256 digests, never in the clear.
pub struct RateLimiter {
    max: usize,
    window: Duration,
    hits: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    /// `max == 0` admits everything.
    pub fn new(max: u32, window: Duration) -> Self {
        Self {
            max: max as usize,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Record a request from `ip`. Returns `false` when the client already
    /// used its allowance for the current window.
    pub async fn check(&self, ip: &str) -> bool {
        if self.max == 0 {
            return true;
        }
        let now = Instant::now();
        let cutoff = now.checked_sub(self.window);
        let is_stale = |t: &Instant| cutoff.is_some_and(|cutoff| *t <= cutoff);

        let mut hits = self.hits.lock().await;
        if hits.len() >= SWEEP_THRESHOLD {
            hits.retain(|_, window| window.back().is_some_and(|t| !is_stale(t)));
        }

        let window = hits.entry(hash_identity(ip, "")).or_default();
        while window.front().is_some_and(is_stale) {
            window.pop_front();
        }
        if window.len() >= self.max {
            return false;
        }
        window.push_back(now);
        true
    }

    pub async fn tracked_clients(&self) -> usize {
        self.hits.lock().await.len()
    }
}
