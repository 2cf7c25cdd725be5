use async_trait::async_trait;
use chrono::{DateTime, Utc};

use tally_core::analytics::EventStore;
use tally_core::chart::Dimension;
use tally_core::event::{ChartRow, Event, TableRow, Website};

use crate::DuckDbBackend;

#[async_trait]
impl EventStore for DuckDbBackend {
    async fn insert_event(&self, event: &Event) -> anyhow::Result<()> {
        DuckDbBackend::insert_event(self, event).await
    }

    async fn events_since(&self, start: DateTime<Utc>) -> anyhow::Result<Vec<ChartRow>> {
        crate::queries::chart::events_since_inner(self, start).await
    }

    async fn top_values(&self, dimension: Dimension) -> anyhow::Result<Vec<TableRow>> {
        crate::queries::stats::top_values_inner(self, dimension).await
    }

    async fn top_sources(&self) -> anyhow::Result<Vec<TableRow>> {
        crate::queries::stats::top_sources_inner(self).await
    }

    async fn recent_events(&self, limit: i64) -> anyhow::Result<Vec<Event>> {
        crate::queries::events::recent_events_inner(self, limit).await
    }

    async fn list_websites(&self) -> anyhow::Result<Vec<Website>> {
        DuckDbBackend::list_websites(self).await
    }

    async fn add_website(&self, name: &str, url: &str) -> anyhow::Result<Website> {
        DuckDbBackend::create_website(self, name, url).await
    }

    async fn delete_website(&self, id: &str) -> anyhow::Result<bool> {
        DuckDbBackend::delete_website(self, id).await
    }

    async fn ping(&self) -> anyhow::Result<()> {
        DuckDbBackend::ping(self).await
    }
}
