use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: String,
    pub duckdb_memory_limit: String,
    pub public_url: String,
    pub heartbeat_secs: u64,
    pub subscriber_capacity: usize,
    /// Honour `X-Forwarded-For` when deriving the client address. Only safe
    /// behind a reverse proxy that overwrites the header.
    pub trust_proxy: bool,
    /// Ingestion requests allowed per client address within one window.
    /// `0` disables the limiter.
    pub rate_limit_max: u32,
    pub rate_limit_window_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            port: std::env::var("TALLY_PORT")
                .unwrap_or_else(|_| "8091".to_string())
                .parse()
                .map_err(|e| format!("invalid port: {e}"))?,
            data_dir: std::env::var("TALLY_DATA_DIR").unwrap_or_else(|_| "./data".to_string()),
            duckdb_memory_limit: std::env::var("TALLY_DUCKDB_MEMORY")
                .unwrap_or_else(|_| "1GB".to_string()),
            public_url: std::env::var("TALLY_PUBLIC_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:8091".to_string()),
            heartbeat_secs: std::env::var("TALLY_HEARTBEAT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(15),
            subscriber_capacity: std::env::var("TALLY_SUBSCRIBER_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|cap| *cap > 0)
                .unwrap_or(10),
            trust_proxy: std::env::var("TALLY_TRUST_PROXY")
                .map(|v| v == "true")
                .unwrap_or(false),
            rate_limit_max: std::env::var("TALLY_RATE_LIMIT_MAX")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(100),
            rate_limit_window_secs: std::env::var("TALLY_RATE_LIMIT_WINDOW_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(60),
        })
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8091,
            data_dir: "./data".to_string(),
            duckdb_memory_limit: "1GB".to_string(),
            public_url: "http://localhost:8091".to_string(),
            heartbeat_secs: 15,
            subscriber_capacity: 10,
            trust_proxy: false,
            rate_limit_max: 100,
            rate_limit_window_secs: 60,
        }
    }
}
