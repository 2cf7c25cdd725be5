//! Read-side views over the event store.
//!
//! Every function degrades to an empty result when the store fails or the
//! request names something outside the allow-lists; the failure is logged.

use chrono::{DateTime, Utc};
use tracing::error;

use tally_core::{
    analytics::EventStore,
    chart::{apply_percentages, bucket_events, collapse_rows, source_host, Dimension, TimeRange},
    event::{ChartDataPoint, Event, TableRow},
};

/// A ranked breakdown with shares filled in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Breakdown {
    pub total: i64,
    pub rows: Vec<TableRow>,
}

impl Breakdown {
    fn from_rows(mut rows: Vec<TableRow>) -> Self {
        let total = apply_percentages(&mut rows);
        Self { total, rows }
    }
}

fn row_limit(limit: i64) -> usize {
    usize::try_from(limit).unwrap_or(0)
}

pub async fn chart(store: &dyn EventStore, range: TimeRange, now: DateTime<Utc>) -> Vec<ChartDataPoint> {
    match store.events_since(range.start(now)).await {
        Ok(rows) => bucket_events(range, now, &rows),
        Err(e) => {
            error!(error = %e, range = range.as_str(), "Chart query failed");
            Vec::new()
        }
    }
}

/// Top values of the dimension called `name`. Unknown names never reach the
/// store.
pub async fn top_stats(store: &dyn EventStore, name: &str, limit: i64) -> Breakdown {
    let dimension = match Dimension::from_name(name) {
        Ok(dimension) => dimension,
        Err(e) => {
            error!(error = %e, "Rejected stats dimension");
            return Breakdown::default();
        }
    };
    match store.top_values(dimension).await {
        Ok(rows) => Breakdown::from_rows(collapse_rows(
            rows,
            |raw| dimension.display_key(raw),
            row_limit(limit),
        )),
        Err(e) => {
            error!(error = %e, dimension = name, "Top values query failed");
            Breakdown::default()
        }
    }
}

pub async fn top_sources(store: &dyn EventStore, limit: i64) -> Breakdown {
    match store.top_sources().await {
        Ok(rows) => Breakdown::from_rows(collapse_rows(rows, source_host, row_limit(limit))),
        Err(e) => {
            error!(error = %e, "Sources query failed");
            Breakdown::default()
        }
    }
}

pub async fn recent(store: &dyn EventStore, limit: i64) -> Vec<Event> {
    store.recent_events(limit).await.unwrap_or_else(|e| {
        error!(error = %e, "Recent events query failed");
        Vec::new()
    })
}
