use anyhow::Result;
use chrono::{DateTime, Utc};

use tally_core::event::ChartRow;

use crate::schema::sql_timestamp;
use crate::DuckDbBackend;

/// Rows feeding the traffic chart: every event at or after `start`, oldest first.
///
/// Bucketing happens in `tally_core::chart::bucket_events`; this only fetches.
pub async fn events_since_inner(db: &DuckDbBackend, start: DateTime<Utc>) -> Result<Vec<ChartRow>> {
    let conn = db.conn.lock().await;
    let mut stmt = conn.prepare(
        "SELECT epoch_us(created_at), is_bot, visitor_id \
         FROM events \
         WHERE created_at >= CAST(?1 AS TIMESTAMP) \
         ORDER BY created_at ASC, id ASC",
    )?;
    let rows = stmt.query_map(duckdb::params![sql_timestamp(&start)], |row| {
        let micros: i64 = row.get(0)?;
        let is_bot: bool = row.get(1)?;
        let visitor_id: String = row.get(2)?;
        Ok((micros, is_bot, visitor_id))
    })?;

    let mut out = Vec::new();
    for row in rows {
        let (micros, is_bot, visitor_id) = row?;
        let Some(timestamp) = DateTime::<Utc>::from_timestamp_micros(micros) else {
            tracing::warn!(micros, "Skipping event with out-of-range timestamp");
            continue;
        };
        out.push(ChartRow {
            timestamp,
            is_bot,
            visitor_id,
        });
    }
    Ok(out)
}
