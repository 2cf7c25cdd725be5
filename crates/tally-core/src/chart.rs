//! Time bucketing and top-N shaping for dashboard reads.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::url_host;
use crate::error::CoreError;
use crate::event::{ChartDataPoint, ChartRow, TableRow};

/// Referrer value that stands for "no referrer" in source breakdowns.
pub const DIRECT: &str = "Direct";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeRange {
    #[default]
    #[serde(rename = "24h")]
    Last24Hours,
    #[serde(rename = "7d")]
    Last7Days,
    #[serde(rename = "30d")]
    Last30Days,
}

impl TimeRange {
    pub fn parse(raw: Option<&str>) -> Result<Self, CoreError> {
        match raw.map(str::trim) {
            None | Some("") | Some("24h") => Ok(Self::Last24Hours),
            Some("7d") => Ok(Self::Last7Days),
            Some("30d") => Ok(Self::Last30Days),
            Some(other) => Err(CoreError::UnknownRange(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Last24Hours => "24h",
            Self::Last7Days => "7d",
            Self::Last30Days => "30d",
        }
    }

    pub fn bucket_count(&self) -> usize {
        match self {
            Self::Last24Hours => 24,
            Self::Last7Days => 7,
            Self::Last30Days => 30,
        }
    }

    /// Width of one bucket.
    pub fn unit(&self) -> Duration {
        match self {
            Self::Last24Hours => Duration::hours(1),
            Self::Last7Days | Self::Last30Days => Duration::days(1),
        }
    }

    pub fn window(&self) -> Duration {
        self.unit() * self.bucket_count() as i32
    }

    /// Inclusive lower bound of the window ending at `now`.
    pub fn start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.window()
    }

    fn label(&self, at: DateTime<Utc>) -> String {
        match self {
            Self::Last24Hours => at.format("%H:00").to_string(),
            Self::Last7Days => at.format("%a").to_string(),
            Self::Last30Days => at.format("%d %b").to_string(),
        }
    }
}

/// Fold `rows` into `range.bucket_count()` buckets ending at `now`, oldest first.
///
/// An event `age` old lands in bucket `N - 1 - floor(age / unit)`; anything
/// outside `[0, N)` is dropped. Bots only count as views and bots. For humans
/// the seen-set spans the whole window: a visitor's first event is "new" in
/// its bucket and every later one is "returning" in its own bucket.
///
/// `rows` must be ordered by timestamp ascending for "first" to mean earliest.
pub fn bucket_events(range: TimeRange, now: DateTime<Utc>, rows: &[ChartRow]) -> Vec<ChartDataPoint> {
    let n = range.bucket_count();
    let unit = range.unit();
    let mut buckets: Vec<ChartDataPoint> = (0..n)
        .map(|i| ChartDataPoint {
            label: range.label(now - unit * (n - 1 - i) as i32),
            ..ChartDataPoint::default()
        })
        .collect();

    let unit_ms = unit.num_milliseconds();
    let mut seen: HashSet<&str> = HashSet::new();
    for row in rows {
        let age_ms = (now - row.timestamp).num_milliseconds();
        let index = n as i64 - 1 - age_ms.div_euclid(unit_ms);
        let Ok(index) = usize::try_from(index) else {
            continue;
        };
        let Some(bucket) = buckets.get_mut(index) else {
            continue;
        };

        bucket.views += 1;
        if row.is_bot {
            bucket.bots += 1;
        } else if seen.insert(row.visitor_id.as_str()) {
            bucket.new_visitors += 1;
        } else {
            bucket.returning_visitors += 1;
        }
    }
    buckets
}

/// Event attributes eligible for top-N breakdowns.
///
/// Each variant maps to one fixed column; names outside this set are rejected
/// before any query is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dimension {
    #[serde(rename = "current_url")]
    PageUrl,
    #[serde(rename = "country")]
    Country,
    #[serde(rename = "os")]
    Os,
    #[serde(rename = "browser")]
    Browser,
    #[serde(rename = "screen_resolution")]
    ScreenResolution,
    #[serde(rename = "referrer")]
    Referrer,
    #[serde(rename = "keyword")]
    Keyword,
    #[serde(rename = "device")]
    Device,
}

impl Dimension {
    pub const ALL: [Dimension; 8] = [
        Dimension::PageUrl,
        Dimension::Country,
        Dimension::Os,
        Dimension::Browser,
        Dimension::ScreenResolution,
        Dimension::Referrer,
        Dimension::Keyword,
        Dimension::Device,
    ];

    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|d| d.column() == name)
            .ok_or_else(|| CoreError::UnknownDimension(name.to_string()))
    }

    /// The `events` column backing this dimension.
    pub fn column(&self) -> &'static str {
        match self {
            Dimension::PageUrl => "current_url",
            Dimension::Country => "country",
            Dimension::Os => "os",
            Dimension::Browser => "browser",
            Dimension::ScreenResolution => "screen_resolution",
            Dimension::Referrer => "referrer",
            Dimension::Keyword => "keyword",
            Dimension::Device => "device",
        }
    }

    /// Display form of a stored value: paths for pages, hosts for referrers.
    pub fn display_key(&self, raw: &str) -> String {
        match self {
            Dimension::PageUrl => page_path(raw),
            Dimension::Referrer => source_host(raw),
            _ => raw.to_string(),
        }
    }
}

/// Path component of a page URL. Empty input or path → `/`; unparsable input is returned as-is.
pub fn page_path(raw: &str) -> String {
    if raw.is_empty() {
        return "/".to_string();
    }
    match Url::parse(raw) {
        Ok(url) if url.path().is_empty() => "/".to_string(),
        Ok(url) => url.path().to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Host of a referrer with the port removed. `""` and [`DIRECT`] pass through.
pub fn source_host(raw: &str) -> String {
    if raw.is_empty() || raw == DIRECT {
        return raw.to_string();
    }
    url_host(raw).unwrap_or_else(|| raw.to_string())
}

/// Rewrite keys through `display`, merge rows that collapse onto the same key,
/// then keep the `limit` largest, count descending and ties by key.
///
/// `rows` must be the full, unlimited breakdown: a variant cut before merging
/// would be missing from its key's count.
pub fn collapse_rows(
    rows: Vec<TableRow>,
    display: impl Fn(&str) -> String,
    limit: usize,
) -> Vec<TableRow> {
    let mut merged: HashMap<String, i64> = HashMap::with_capacity(rows.len());
    for row in rows {
        *merged.entry(display(&row.key)).or_default() += row.value;
    }
    let mut out: Vec<TableRow> = merged
        .into_iter()
        .map(|(key, value)| TableRow::new(key, value))
        .collect();
    out.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.key.cmp(&b.key)));
    out.truncate(limit);
    out
}

/// Fill `percentage` on each row as its share of the rows' summed value.
/// Returns that total.
pub fn apply_percentages(rows: &mut [TableRow]) -> i64 {
    let total: i64 = rows.iter().map(|r| r.value).sum();
    for row in rows.iter_mut() {
        row.percentage = Some(if total > 0 {
            row.value as f64 * 100.0 / total as f64
        } else {
            0.0
        });
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 12, 30, 0).single().expect("valid time")
    }

    fn row(ago: Duration, visitor: &str, is_bot: bool) -> ChartRow {
        ChartRow {
            timestamp: now() - ago,
            is_bot,
            visitor_id: visitor.to_string(),
        }
    }

    fn sorted(mut rows: Vec<ChartRow>) -> Vec<ChartRow> {
        rows.sort_by_key(|r| r.timestamp);
        rows
    }

    #[test]
    fn range_parse() {
        assert_eq!(TimeRange::parse(None).expect("default"), TimeRange::Last24Hours);
        assert_eq!(TimeRange::parse(Some("7d")).expect("7d"), TimeRange::Last7Days);
        assert_eq!(TimeRange::parse(Some("30d")).expect("30d"), TimeRange::Last30Days);
        assert!(TimeRange::parse(Some("1y")).is_err());
    }

    #[test]
    fn bucket_counts_and_labels() {
        let points = bucket_events(TimeRange::Last24Hours, now(), &[]);
        assert_eq!(points.len(), 24);
        assert_eq!(points[23].label, "12:00");
        assert_eq!(points[0].label, "13:00");

        let points = bucket_events(TimeRange::Last7Days, now(), &[]);
        assert_eq!(points.len(), 7);
        // 2026-03-14 is a Saturday.
        assert_eq!(points[6].label, "Sat");
        assert_eq!(points[0].label, "Sun");

        let points = bucket_events(TimeRange::Last30Days, now(), &[]);
        assert_eq!(points.len(), 30);
        assert_eq!(points[29].label, "14 Mar");
        assert_eq!(points[0].label, "13 Feb");
    }

    #[test]
    fn bucket_index_follows_age() {
        let rows = sorted(vec![
            row(Duration::minutes(5), "a", false),
            row(Duration::minutes(59), "b", false),
            row(Duration::minutes(61), "c", false),
            row(Duration::hours(23) + Duration::minutes(59), "d", false),
        ]);
        let points = bucket_events(TimeRange::Last24Hours, now(), &rows);
        assert_eq!(points[23].views, 2);
        assert_eq!(points[22].views, 1);
        assert_eq!(points[0].views, 1);
    }

    #[test]
    fn out_of_window_events_are_dropped() {
        let rows = sorted(vec![
            row(Duration::hours(24), "old", false),
            row(Duration::hours(30), "older", false),
            row(Duration::minutes(-5), "future", false),
        ]);
        let points = bucket_events(TimeRange::Last24Hours, now(), &rows);
        assert_eq!(points.iter().map(|p| p.views).sum::<i64>(), 0);
    }

    #[test]
    fn new_versus_returning_is_window_scoped() {
        let rows = sorted(vec![
            row(Duration::hours(5), "alice", false),
            row(Duration::hours(5) + Duration::minutes(10), "alice", false),
            row(Duration::hours(1), "alice", false),
            row(Duration::hours(1), "bob", false),
            row(Duration::minutes(1), "crawler", true),
            row(Duration::minutes(2), "crawler", true),
        ]);
        let points = bucket_events(TimeRange::Last24Hours, now(), &rows);

        let five_ago = &points[23 - 5];
        assert_eq!(five_ago.new_visitors, 1);
        assert_eq!(five_ago.returning_visitors, 1);

        let one_ago = &points[22];
        assert_eq!(one_ago.new_visitors, 1);
        assert_eq!(one_ago.returning_visitors, 1);

        assert_eq!(points[23].bots, 2);
        assert_eq!(points[23].new_visitors, 0);
    }

    #[test]
    fn buckets_conserve_views() {
        let mut rows = Vec::new();
        for i in 0..200i64 {
            let visitor = format!("v{}", i % 17);
            rows.push(row(Duration::minutes(i * 97 % (30 * 24 * 60 + 600)), &visitor, i % 5 == 0));
        }
        let rows = sorted(rows);
        for range in [TimeRange::Last24Hours, TimeRange::Last7Days, TimeRange::Last30Days] {
            let points = bucket_events(range, now(), &rows);
            let views: i64 = points.iter().map(|p| p.views).sum();
            let parts: i64 = points
                .iter()
                .map(|p| p.new_visitors + p.returning_visitors + p.bots)
                .sum();
            assert_eq!(views, parts, "range {}", range.as_str());

            let start = range.start(now());
            let expected = rows
                .iter()
                .filter(|r| r.timestamp > start && r.timestamp <= now())
                .count() as i64;
            assert_eq!(views, expected, "range {}", range.as_str());

            let distinct: HashSet<&str> = rows
                .iter()
                .filter(|r| !r.is_bot && r.timestamp > start && r.timestamp <= now())
                .map(|r| r.visitor_id.as_str())
                .collect();
            let new: i64 = points.iter().map(|p| p.new_visitors).sum();
            assert_eq!(new, distinct.len() as i64, "range {}", range.as_str());
        }
    }

    #[test]
    fn dimension_allow_list() {
        for d in Dimension::ALL {
            assert_eq!(Dimension::from_name(d.column()).expect("known"), d);
        }
        assert!(Dimension::from_name("visitor_id").is_err());
        assert!(Dimension::from_name("country; DROP TABLE events").is_err());
        assert!(Dimension::from_name("").is_err());
    }

    #[test]
    fn page_paths() {
        assert_eq!(page_path(""), "/");
        assert_eq!(page_path("https://acme.test"), "/");
        assert_eq!(page_path("https://acme.test/pricing?x=1"), "/pricing");
        assert_eq!(page_path("acme.test/pricing"), "acme.test/pricing");
    }

    #[test]
    fn source_hosts() {
        assert_eq!(source_host(DIRECT), DIRECT);
        assert_eq!(source_host(""), "");
        assert_eq!(source_host("https://www.google.com:443/search?q=x"), "www.google.com");
        assert_eq!(source_host("http://news.ycombinator.com:8080/item"), "news.ycombinator.com");
    }

    #[test]
    fn collapse_merges_and_resorts() {
        let rows = vec![
            TableRow::new("https://a.test/x", 3),
            TableRow::new("https://b.test/", 4),
            TableRow::new("https://a.test/y", 2),
        ];
        let out = collapse_rows(rows, source_host, 10);
        assert_eq!(out, vec![TableRow::new("a.test", 5), TableRow::new("b.test", 4)]);
    }

    #[test]
    fn collapse_merges_before_cutting_to_limit() {
        let rows = vec![
            TableRow::new("https://a.test/y", 6),
            TableRow::new("https://a.test/x?u=1", 5),
            TableRow::new("https://a.test/x?u=2", 5),
        ];
        assert_eq!(collapse_rows(rows.clone(), page_path, 1), vec![TableRow::new("/x", 10)]);
        assert_eq!(
            collapse_rows(rows, page_path, 2),
            vec![TableRow::new("/x", 10), TableRow::new("/y", 6)]
        );
    }

    #[test]
    fn collapse_breaks_ties_by_key() {
        let rows = vec![TableRow::new("b", 2), TableRow::new("a", 2), TableRow::new("c", 3)];
        let out = collapse_rows(rows, |raw| raw.to_string(), 10);
        let keys: Vec<&str> = out.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["c", "a", "b"]);
    }

    #[test]
    fn percentages_sum_to_hundred() {
        let mut rows = vec![TableRow::new("a", 3), TableRow::new("b", 1)];
        let total = apply_percentages(&mut rows);
        assert_eq!(total, 4);
        assert_eq!(rows[0].percentage, Some(75.0));
        assert_eq!(rows[1].percentage, Some(25.0));

        let mut empty: Vec<TableRow> = Vec::new();
        assert_eq!(apply_percentages(&mut empty), 0);
    }
}
