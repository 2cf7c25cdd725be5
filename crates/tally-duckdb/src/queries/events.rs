use anyhow::Result;
use chrono::{DateTime, Utc};

use tally_core::event::Event;

use crate::DuckDbBackend;

/// The newest `limit` events, newest first. Same-instant events are ordered
/// by insertion, latest first. Rows whose timestamp does not fit a
/// `DateTime<Utc>` are skipped with a warning, as in the chart query.
pub async fn recent_events_inner(db: &DuckDbBackend, limit: i64) -> Result<Vec<Event>> {
    let conn = db.conn.lock().await;
    let mut stmt = conn.prepare(
        r#"
        SELECT
            website_id, epoch_us(created_at), visitor_id, ip_hash,
            country, country_code, user_agent, screen_resolution,
            referrer, current_url, is_bot,
            os, browser, device, keyword
        FROM events
        ORDER BY created_at DESC, id DESC
        LIMIT ?1
        "#,
    )?;

    let rows = stmt.query_map(duckdb::params![limit], |row| {
        let micros: i64 = row.get(1)?;
        let Some(timestamp) = DateTime::<Utc>::from_timestamp_micros(micros) else {
            tracing::warn!(micros, "Skipping event with out-of-range timestamp");
            return Ok(None);
        };
        Ok(Some(Event {
            website_id: row.get(0)?,
            timestamp,
            visitor_id: row.get(2)?,
            ip_hash: row.get(3)?,
            country: row.get(4)?,
            country_code: row.get(5)?,
            user_agent: row.get(6)?,
            screen_resolution: row.get(7)?,
            referrer: row.get(8)?,
            current_url: row.get(9)?,
            is_bot: row.get(10)?,
            os: row.get(11)?,
            browser: row.get(12)?,
            device: row.get(13)?,
            keyword: row.get(14)?,
        }))
    })?;

    let mut out = Vec::new();
    for row in rows {
        if let Some(event) = row? {
            out.push(event);
        }
    }
    Ok(out)
}
