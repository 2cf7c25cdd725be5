use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use tally_core::chart::TimeRange;

use crate::{aggregation, state::AppState};

const DEFAULT_TOP_LIMIT: i64 = 10;
const DEFAULT_RECENT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct ChartQuery {
    pub range: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TopQuery {
    pub dimension: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

fn clamp_limit(limit: Option<i64>, default: i64) -> i64 {
    limit.unwrap_or(default).clamp(1, MAX_LIMIT)
}

/// `GET /api/stats/chart?range=24h|7d|30d`: bucketed views and visitors.
pub async fn chart(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChartQuery>,
) -> Json<Value> {
    let range = TimeRange::parse(query.range.as_deref()).unwrap_or_else(|e| {
        warn!(error = %e, "Falling back to 24h range");
        TimeRange::default()
    });
    let points = aggregation::chart(state.store.as_ref(), range, Utc::now()).await;
    Json(json!({
        "data": {
            "range": range.as_str(),
            "points": points,
        }
    }))
}

/// `GET /api/stats/top?dimension=<name>&limit=N`
pub async fn top(State(state): State<Arc<AppState>>, Query(query): Query<TopQuery>) -> Json<Value> {
    let dimension = query.dimension.unwrap_or_default();
    let limit = clamp_limit(query.limit, DEFAULT_TOP_LIMIT);
    let breakdown = aggregation::top_stats(state.store.as_ref(), &dimension, limit).await;
    Json(json!({
        "data": {
            "dimension": dimension,
            "total": breakdown.total,
            "rows": breakdown.rows,
        }
    }))
}

/// `GET /api/stats/sources?limit=N`: referrer hosts, with `Direct` for none.
pub async fn sources(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LimitQuery>,
) -> Json<Value> {
    let limit = clamp_limit(query.limit, DEFAULT_TOP_LIMIT);
    let breakdown = aggregation::top_sources(state.store.as_ref(), limit).await;
    Json(json!({
        "data": {
            "dimension": "sources",
            "total": breakdown.total,
            "rows": breakdown.rows,
        }
    }))
}

/// `GET /api/stats/recent?limit=N`
pub async fn recent(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LimitQuery>,
) -> Json<Value> {
    let limit = clamp_limit(query.limit, DEFAULT_RECENT_LIMIT);
    let events = aggregation::recent(state.store.as_ref(), limit).await;
    Json(json!({ "data": events }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_default_and_clamp() {
        assert_eq!(clamp_limit(None, DEFAULT_TOP_LIMIT), 10);
        assert_eq!(clamp_limit(Some(0), DEFAULT_TOP_LIMIT), 1);
        assert_eq!(clamp_limit(Some(-5), DEFAULT_RECENT_LIMIT), 1);
        assert_eq!(clamp_limit(Some(5000), DEFAULT_RECENT_LIMIT), 100);
        assert_eq!(clamp_limit(Some(42), DEFAULT_RECENT_LIMIT), 42);
    }
}
