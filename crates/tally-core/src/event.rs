use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The body a tracking script sends to `POST /api/track`.
///
/// Every field is optional on the wire. `timestamp` and `visitor_id` may be
/// present but are not declared here: both are always assigned by the server,
/// so serde simply skips them along with any other unknown field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TrackPayload {
    /// Ignored: events are filed under the website `current_url` matches.
    pub website_id: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub screen_resolution: Option<String>,
    pub referrer: Option<String>,
    pub current_url: Option<String>,
    pub user_agent: Option<String>,
    /// Client-declared address. Only consulted when the transport address is
    /// unknown.
    pub ip: Option<String>,
    /// Sent by older trackers. The script path never records a bot.
    pub is_bot: Option<bool>,
}

/// An enriched, stored page visit. Mirrors the DuckDB `events` table.
///
/// `visitor_id` and `ip_hash` always carry the same digest. The raw client
/// address is never part of this struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub website_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub visitor_id: String,
    pub ip_hash: String,
    pub country: String,
    pub country_code: String,
    pub user_agent: String,
    pub screen_resolution: String,
    pub referrer: String,
    pub current_url: String,
    pub is_bot: bool,
    pub os: String,
    pub browser: String,
    pub device: String,
    pub keyword: String,
}

/// A registered site. The host of `url` is what ingestion is authorized against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Website {
    pub id: String,
    pub name: String,
    pub url: String,
    pub created_at: String,
}

/// The three columns the chart query needs from each stored event.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRow {
    pub timestamp: DateTime<Utc>,
    pub is_bot: bool,
    pub visitor_id: String,
}

/// One time bucket of the traffic chart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChartDataPoint {
    pub label: String,
    pub views: i64,
    pub new_visitors: i64,
    pub returning_visitors: i64,
    pub bots: i64,
}

/// One row of a top-N breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub key: String,
    pub value: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
}

impl TableRow {
    pub fn new(key: impl Into<String>, value: i64) -> Self {
        Self {
            key: key.into(),
            value,
            percentage: None,
        }
    }
}
