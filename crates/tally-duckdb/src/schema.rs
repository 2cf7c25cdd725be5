/// DuckDB initialization SQL.
///
/// Executed once at open time via `Connection::execute_batch`. Every
/// statement is `IF NOT EXISTS`, so re-running on each startup is a no-op.
///
/// `memory_limit` comes from `Config.duckdb_memory_limit` (env
/// `TALLY_DUCKDB_MEMORY`, default `"1GB"`).
///
/// No column holds the client address; only the `ip_hash` digest is written.
pub fn init_sql(memory_limit: &str) -> String {
    format!(
        r#"SET memory_limit = '{memory_limit}';
SET threads = 2;

-- ===========================================
-- WEBSITES (authorization registry)
-- ===========================================
CREATE TABLE IF NOT EXISTS websites (
    id              VARCHAR PRIMARY KEY,           -- 'site_' + 10 random [0-9a-z]
    name            VARCHAR NOT NULL,
    url             VARCHAR NOT NULL,              -- host (port stripped) is the auth key
    created_at      TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

-- ===========================================
-- EVENTS (append-only)
-- ===========================================
CREATE SEQUENCE IF NOT EXISTS events_id_seq START 1;

CREATE TABLE IF NOT EXISTS events (
    id                  BIGINT PRIMARY KEY DEFAULT nextval('events_id_seq'),
    website_id          VARCHAR,                   -- NULL when not associated
    created_at          TIMESTAMP NOT NULL,        -- server clock, UTC
    visitor_id          VARCHAR NOT NULL,          -- sha256(ip ++ ua), same as ip_hash
    ip_hash             VARCHAR NOT NULL,
    country             VARCHAR NOT NULL DEFAULT '',
    country_code        VARCHAR NOT NULL DEFAULT '',
    user_agent          VARCHAR NOT NULL DEFAULT '',
    screen_resolution   VARCHAR NOT NULL DEFAULT '',
    referrer            VARCHAR NOT NULL DEFAULT '',
    current_url         VARCHAR NOT NULL DEFAULT '',
    is_bot              BOOLEAN NOT NULL DEFAULT false,
    os                  VARCHAR NOT NULL DEFAULT '',
    browser             VARCHAR NOT NULL DEFAULT '',
    device              VARCHAR NOT NULL DEFAULT '',
    keyword             VARCHAR NOT NULL DEFAULT ''
);
-- Chart window scans and recent-events ordering.
CREATE INDEX IF NOT EXISTS idx_events_created_at ON events(created_at);
"#
    )
}

/// Format a UTC instant the way the `created_at` columns expect it.
pub(crate) fn sql_timestamp(at: &chrono::DateTime<chrono::Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}
