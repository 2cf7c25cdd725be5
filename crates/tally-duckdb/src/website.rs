use anyhow::Result;
use tracing::info;

use tally_core::event::Website;

use crate::DuckDbBackend;

/// Generate a website ID: "site_" + 10 random alphanumeric chars.
fn generate_website_id() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let chars: String = (0..10)
        .map(|_| {
            let idx = rng.gen_range(0..36);
            if idx < 10 {
                (b'0' + idx) as char
            } else {
                (b'a' + idx - 10) as char
            }
        })
        .collect();
    format!("site_{}", chars)
}

fn website_from_row(row: &duckdb::Row<'_>) -> duckdb::Result<Website> {
    Ok(Website {
        id: row.get(0)?,
        name: row.get(1)?,
        url: row.get(2)?,
        created_at: row.get(3)?,
    })
}

impl DuckDbBackend {
    pub async fn create_website(&self, name: &str, url: &str) -> Result<Website> {
        let conn = self.conn.lock().await;
        let id = generate_website_id();

        conn.execute(
            "INSERT INTO websites (id, name, url, created_at) VALUES (?1, ?2, ?3, CURRENT_TIMESTAMP)",
            duckdb::params![id, name, url],
        )?;

        // Read back the created row to get the timestamp.
        let website = conn
            .prepare(
                "SELECT id, name, url, CAST(created_at AS VARCHAR) FROM websites WHERE id = ?1",
            )?
            .query_row(duckdb::params![id], website_from_row)?;

        info!(website_id = %website.id, url = %website.url, "Website registered");
        Ok(website)
    }

    /// All registered websites, newest first.
    pub async fn list_websites(&self) -> Result<Vec<Website>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, name, url, CAST(created_at AS VARCHAR) \
             FROM websites ORDER BY created_at DESC, id",
        )?;
        let rows = stmt.query_map([], website_from_row)?;

        let mut websites = Vec::new();
        for row in rows {
            websites.push(row?);
        }
        Ok(websites)
    }

    /// Remove a website from the registry. Its past events are kept.
    pub async fn delete_website(&self, id: &str) -> Result<bool> {
        let conn = self.conn.lock().await;
        let deleted = conn.execute("DELETE FROM websites WHERE id = ?1", duckdb::params![id])?;
        if deleted > 0 {
            info!(website_id = id, "Website deleted");
        }
        Ok(deleted > 0)
    }

    /// Insert or replace a website row with a fixed id.
    ///
    /// Intended for test fixtures. Safe to call repeatedly with the same `id`.
    pub async fn seed_website(&self, id: &str, url: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            r#"INSERT INTO websites (id, name, url, created_at)
               VALUES (?1, ?2, ?3, CURRENT_TIMESTAMP)
               ON CONFLICT (id) DO UPDATE SET url = EXCLUDED.url"#,
            duckdb::params![id, id, url],
        )?;
        Ok(())
    }
}
