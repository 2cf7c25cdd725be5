use std::sync::Arc;

use anyhow::Result;
use duckdb::Connection;
use tokio::sync::Mutex;
use tracing::info;

use tally_core::event::Event;

use crate::schema::{init_sql, sql_timestamp};

/// The DuckDB-backed event store.
///
/// DuckDB is single-writer, so the connection sits behind an async mutex.
/// Each insert is one statement with no surrounding transaction: a crash
/// mid-write loses at most that event.
pub struct DuckDbBackend {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl DuckDbBackend {
    /// Open (or create) a DuckDB database file at `path` and run the schema.
    pub fn open(path: &str, memory_limit: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(&init_sql(memory_limit))?;
        info!(path, memory_limit, "DuckDB opened");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an **in-memory** database. Data is discarded on drop; tests only.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(&init_sql("1GB"))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Append one enriched event.
    pub async fn insert_event(&self, event: &Event) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            r#"INSERT INTO events (
                website_id, created_at, visitor_id, ip_hash,
                country, country_code, user_agent, screen_resolution,
                referrer, current_url, is_bot,
                os, browser, device, keyword
            ) VALUES (
                ?1,  CAST(?2 AS TIMESTAMP),  ?3,  ?4,
                ?5,  ?6,  ?7,  ?8,
                ?9,  ?10, ?11,
                ?12, ?13, ?14, ?15
            )"#,
            duckdb::params![
                event.website_id,
                sql_timestamp(&event.timestamp),
                event.visitor_id,
                event.ip_hash,
                event.country,
                event.country_code,
                event.user_agent,
                event.screen_resolution,
                event.referrer,
                event.current_url,
                event.is_bot,
                event.os,
                event.browser,
                event.device,
                event.keyword,
            ],
        )?;
        Ok(())
    }

    /// Execute `SELECT 1` as a lightweight liveness check.
    pub async fn ping(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute_batch("SELECT 1")?;
        Ok(())
    }

    /// Acquire the connection lock for direct queries.
    ///
    /// Intended for integration tests that need to inspect or backdate rows.
    pub async fn conn_for_test(&self) -> tokio::sync::MutexGuard<'_, Connection> {
        self.conn.lock().await
    }
}
