//! Response DTOs for the proxy server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;

/// Response body for the diagnostics endpoint (GET /api/cache-stats)
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsResponse {
    /// Current number of cached responses
    pub entries: usize,
    /// Maximum number of cached responses
    pub capacity: usize,
    /// Cache keys, oldest first, capped for readability
    pub keys: Vec<String>,
    /// Lookups served from cache
    pub hits: u64,
    /// Lookups that went upstream
    pub misses: u64,
    /// Stale entries dropped on read
    pub expirations: u64,
    /// Entries dropped to make room
    pub evictions: u64,
    /// hits / (hits + misses)
    pub hit_rate: f64,
}

impl CacheStatsResponse {
    /// Creates a new CacheStatsResponse from cache statistics and a key sample
    pub fn new(stats: &CacheStats, capacity: usize, keys: Vec<String>) -> Self {
        Self {
            entries: stats.total_entries,
            capacity,
            keys,
            hits: stats.hits,
            misses: stats.misses,
            expirations: stats.expirations,
            evictions: stats.evictions,
            hit_rate: stats.hit_rate(),
        }
    }
}

/// Response body for POST /api/cache-clear
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub ok: bool,
}

impl ClearResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
