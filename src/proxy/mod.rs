//! Proxy Module
//!
//! Query normalization, the keyed HIT/MISS lifecycle, and the dashboard stats
//! snapshot.

pub mod query;
pub mod service;
pub mod stats;

pub use query::{QueryParams, TtlClass, DEFAULT_CACHE_KEY, KNOWN_FILTERS};
pub use service::{CacheStatus, Fetched, ProxyService, UpstreamTimeouts, CACHE_HEADER};
pub use stats::{StatsSlot, StatsSnapshot, STATS_TTL};
