//! Cache Entry Module
//!
//! Defines a single cached upstream response and its freshness window.

use std::time::Duration;

use serde_json::Value;

// == Cache Entry ==
/// A cached JSON document with the time it was stored and how long it stays fresh.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored document
    pub value: Value,
    /// Store timestamp (Unix milliseconds)
    pub stored_at: u64,
    /// Freshness window
    pub ttl: Duration,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry stamped at `now_ms`.
    pub fn new(value: Value, now_ms: u64, ttl: Duration) -> Self {
        Self {
            value,
            stored_at: now_ms,
            ttl,
        }
    }

    // == Is Expired ==
    /// Checks if the entry is stale at `now_ms`.
    ///
    /// The entry stays fresh while `now - stored_at <= ttl`, so a read landing
    /// exactly on the TTL boundary still hits. A clock that went backwards
    /// counts as zero age.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.age_ms(now_ms) > self.ttl.as_millis() as u64
    }

    // == Age ==
    /// Milliseconds since the entry was stored.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.stored_at)
    }
}
