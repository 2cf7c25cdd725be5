use std::sync::Arc;

use tracing::{debug, error};

use tally_core::{
    analytics::EventStore,
    config::Config,
    domain::authorize,
    event::{Event, Website},
};

use crate::{broker::Broker, rate_limit::RateLimiter};

/// Shared application state injected into every handler via
/// [`axum::extract::State`].
pub struct AppState {
    /// Event and website storage. The DuckDB backend serialises access
    /// internally, so no extra lock lives here.
    pub store: Arc<dyn EventStore>,

    /// Parsed configuration, loaded once at startup.
    pub config: Arc<Config>,

    /// Live fan-out to connected `/api/events` streams.
    pub broker: Arc<Broker>,

    /// Shared by `/api/track` and `/api/track-noscript`.
    pub rate_limiter: RateLimiter,
}

impl AppState {
    pub fn new(store: Arc<dyn EventStore>, config: Config) -> Self {
        let broker = Arc::new(Broker::new(config.subscriber_capacity));
        let rate_limiter = RateLimiter::new(config.rate_limit_max, config.rate_limit_window());
        Self {
            store,
            config: Arc::new(config),
            broker,
            rate_limiter,
        }
    }

    /// The registered website whose host matches `current_url`, if any.
    ///
    /// Reads the registry on every call. A store failure is treated as "no
    /// match".
    pub async fn authorized_website(&self, current_url: &str) -> Option<Website> {
        let websites = match self.store.list_websites().await {
            Ok(websites) => websites,
            Err(e) => {
                error!(error = %e, "Failed to load websites for authorization");
                return None;
            }
        };
        authorize(current_url, &websites).cloned()
    }

    /// Persist then publish. A failed insert is logged and the event is still
    /// published.
    pub async fn record(&self, event: Event) {
        if let Err(e) = self.store.insert_event(&event).await {
            error!(error = %e, website_id = ?event.website_id, "Failed to persist event");
        }
        let delivered = self.broker.publish(event);
        debug!(delivered, "Event published");
    }
}
