//! Storage abstraction shared by ingestion and the aggregation reads.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::chart::Dimension;
use crate::event::{ChartRow, Event, TableRow, Website};

/// Durable storage for events and the website registry.
///
/// Implementations own their concurrency control; callers never wrap a
/// store in an extra lock. Event inserts are single-row and independent.
#[async_trait]
pub trait EventStore: Send + Sync + 'static {
    async fn insert_event(&self, event: &Event) -> anyhow::Result<()>;

    /// `(timestamp, is_bot, visitor_id)` of every event at or after `start`,
    /// oldest first.
    async fn events_since(&self, start: DateTime<Utc>) -> anyhow::Result<Vec<ChartRow>>;

    /// Every non-empty value of `dimension` with its count, highest count
    /// first, ties by value.
    ///
    /// Unlimited: callers rewrite keys (paths, hosts) and merge before
    /// cutting to a top N.
    async fn top_values(&self, dimension: Dimension) -> anyhow::Result<Vec<TableRow>>;

    /// Like `top_values(Referrer)` but empty referrers are counted as
    /// [`crate::chart::DIRECT`] instead of being skipped.
    async fn top_sources(&self) -> anyhow::Result<Vec<TableRow>>;

    /// The newest `limit` events, newest first.
    async fn recent_events(&self, limit: i64) -> anyhow::Result<Vec<Event>>;

    async fn list_websites(&self) -> anyhow::Result<Vec<Website>>;

    async fn add_website(&self, name: &str, url: &str) -> anyhow::Result<Website>;

    /// Returns `false` when no website had that id.
    async fn delete_website(&self, id: &str) -> anyhow::Result<bool>;

    async fn ping(&self) -> anyhow::Result<()>;
}
