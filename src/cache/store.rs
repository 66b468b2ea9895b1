//! Cache Store Module
//!
//! Bounded response cache combining HashMap storage with insertion-order
//! eviction and lazily checked per-entry TTLs.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, Clock, InsertionOrder, SystemClock};

// == Cache Store ==
/// Response cache keyed by canonical query strings.
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Eviction order (first inserted is first out)
    order: InsertionOrder,
    /// Lookup counters
    stats: CacheStats,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// Time source for stamping and expiry checks
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("entries", &self.entries.len())
            .field("max_entries", &self.max_entries)
            .field("stats", &self.stats)
            .finish()
    }
}

impl CacheStore {
    // == Constructor ==
    /// Creates a store holding at most `max_entries` entries, timed by the wall clock.
    pub fn new(max_entries: usize) -> Self {
        Self::with_clock(max_entries, Arc::new(SystemClock))
    }

    /// Creates a store with an explicit time source.
    pub fn with_clock(max_entries: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            order: InsertionOrder::new(),
            stats: CacheStats::new(),
            max_entries,
            clock,
        }
    }

    // == Set ==
    /// Stores a document under `key` for `ttl`, stamped with the current time.
    ///
    /// Overwriting an existing key refreshes its value and timestamp but keeps
    /// its eviction position. Inserting a new key into a full store first
    /// evicts the oldest inserted entry, whether or not that entry is stale.
    pub fn set(&mut self, key: String, value: Value, ttl: Duration) {
        if self.max_entries == 0 {
            return;
        }

        let is_overwrite = self.entries.contains_key(&key);

        if !is_overwrite && self.entries.len() >= self.max_entries {
            if let Some(evicted_key) = self.order.evict_oldest() {
                self.entries.remove(&evicted_key);
                self.stats.record_eviction();
                debug!(key = %evicted_key, "Evicted oldest cache entry");
            }
        }

        let entry = CacheEntry::new(value, self.clock.now_ms(), ttl);
        self.entries.insert(key.clone(), entry);
        self.order.insert(&key);

        self.stats.set_total_entries(self.entries.len());
    }

    // == Get ==
    /// Returns the stored document if it is still fresh.
    ///
    /// A stale entry is removed as a side effect and reported as absent.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        let now = self.clock.now_ms();

        let expired = match self.entries.get(key) {
            None => {
                self.stats.record_miss();
                return None;
            }
            Some(entry) => entry.is_expired(now),
        };

        if expired {
            self.entries.remove(key);
            self.order.remove(key);
            self.stats.set_total_entries(self.entries.len());
            self.stats.record_expiration();
            return None;
        }

        self.stats.record_hit();
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    // == Clear ==
    /// Removes every entry. Counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.stats.set_total_entries(0);
    }

    // == Keys ==
    /// Returns up to `limit` keys, oldest insertion first.
    pub fn keys(&self, limit: usize) -> Vec<String> {
        self.order.iter().take(limit).cloned().collect()
    }

    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    /// Time source the store stamps entries with.
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
