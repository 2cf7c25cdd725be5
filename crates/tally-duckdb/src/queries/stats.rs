use anyhow::Result;

use tally_core::chart::{Dimension, DIRECT};
use tally_core::event::TableRow;

use crate::DuckDbBackend;

/// Counts of every value of one allow-listed column.
///
/// The column name comes from [`Dimension::column`], a closed set of static
/// strings, so it is the only part of the SQL not bound as a parameter.
pub async fn top_values_inner(
    db: &DuckDbBackend,
    dimension: Dimension,
) -> Result<Vec<TableRow>> {
    let column = dimension.column();
    let sql = format!(
        r#"
        SELECT {column} AS dim_value, COUNT(*) AS hits
        FROM events
        WHERE {column} IS NOT NULL AND {column} != ''
        GROUP BY dim_value
        ORDER BY hits DESC, dim_value ASC
        "#
    );

    let conn = db.conn.lock().await;
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| {
        Ok(TableRow::new(row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Traffic sources: referrers, with empty ones counted as `Direct`.
pub async fn top_sources_inner(db: &DuckDbBackend) -> Result<Vec<TableRow>> {
    let sql = format!(
        r#"
        SELECT
            CASE WHEN referrer IS NULL OR referrer = '' THEN '{DIRECT}' ELSE referrer END AS source,
            COUNT(*) AS hits
        FROM events
        GROUP BY source
        ORDER BY hits DESC, source ASC
        "#
    );

    let conn = db.conn.lock().await;
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| {
        Ok(TableRow::new(row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
