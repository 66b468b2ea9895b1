//! Stats Snapshot
//!
//! Reshapes the upstream aggregate document into the dashboard's fixed schema
//! and holds the single cached copy.

use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Map, Value};

/// How long one snapshot is served before a refresh.
pub const STATS_TTL: Duration = Duration::from_secs(60);

/// Page size of the recent-activity fetch.
pub const RECENT_MESSAGES_LIMIT: &str = "20";

// == Stats Snapshot ==
/// Dashboard aggregate. Every field has a default, so a sparse upstream
/// document still produces a complete snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub total_messages: Value,
    pub sample_size: Value,
    pub today: Value,
    pub yesterday: Value,
    pub this_hour: Value,
    pub unique_users: Value,
    pub avg_daily: Value,
    pub day_counts: Value,
    pub hourly_timeline: Value,
    pub type_counts: Value,
    pub top_users: Vec<Value>,
    pub recent_messages: Vec<Value>,
}

impl StatsSnapshot {
    /// Builds a snapshot from the upstream aggregate document.
    ///
    /// `recent` is the result list of the recent-activity fetch, or `None` if
    /// that fetch failed. Without it the aggregate's own `recentMessages` is
    /// used when present. Recent messages without a `user_name` and top users
    /// without a non-blank `name` are dropped.
    pub fn reshape(aggregate: &Value, recent: Option<Vec<Value>>) -> Self {
        let field = |name: &str, default: Value| truthy_or(aggregate.get(name), default);
        let total_messages = field("totalMessages", json!(0));

        let recent_messages = recent
            .or_else(|| array_field(aggregate, "recentMessages"))
            .unwrap_or_default()
            .into_iter()
            .filter(|m| m.get("user_name").map(is_truthy).unwrap_or(false))
            .collect();

        let top_users = array_field(aggregate, "topUsers")
            .unwrap_or_default()
            .into_iter()
            .filter(has_display_name)
            .collect();

        Self {
            sample_size: total_messages.clone(),
            total_messages,
            today: field("today", json!({ "count": 0 })),
            yesterday: field("yesterday", json!({ "count": 0 })),
            this_hour: field("thisHour", json!(0)),
            unique_users: field("uniqueUsers", json!(0)),
            avg_daily: field("avgDaily", json!(0)),
            day_counts: field("dayCounts", Value::Object(Map::new())),
            hourly_timeline: field("hourlyTimeline", json!([])),
            type_counts: field("typeCounts", Value::Object(Map::new())),
            top_users,
            recent_messages,
        }
    }
}

/// Pulls the `results` list out of an upstream message page.
pub fn message_results(page: &Value) -> Vec<Value> {
    array_field(page, "results").unwrap_or_default()
}

// == Field Helpers ==

/// JavaScript truthiness: null, false, 0, NaN and "" are falsy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// The field itself when truthy, whatever its type, otherwise `default`.
fn truthy_or(value: Option<&Value>, default: Value) -> Value {
    match value {
        Some(v) if is_truthy(v) => v.clone(),
        _ => default,
    }
}

fn array_field(doc: &Value, name: &str) -> Option<Vec<Value>> {
    doc.get(name).and_then(Value::as_array).cloned()
}

fn has_display_name(user: &Value) -> bool {
    user.get("name")
        .and_then(Value::as_str)
        .map(|name| !name.trim().is_empty())
        .unwrap_or(false)
}

// == Stats Slot ==
/// Single-slot cache for the current snapshot.
#[derive(Debug, Default)]
pub struct StatsSlot {
    current: Option<(StatsSnapshot, u64)>,
}

impl StatsSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the snapshot if it is younger than [`STATS_TTL`] at `now_ms`.
    pub fn get(&self, now_ms: u64) -> Option<StatsSnapshot> {
        self.current.as_ref().and_then(|(snapshot, fetched_at)| {
            let age = now_ms.saturating_sub(*fetched_at);
            (age < STATS_TTL.as_millis() as u64).then(|| snapshot.clone())
        })
    }

    /// Replaces the slot wholesale.
    pub fn set(&mut self, snapshot: StatsSnapshot, now_ms: u64) {
        self.current = Some((snapshot, now_ms));
    }
}
