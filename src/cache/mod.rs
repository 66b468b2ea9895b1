//! Cache Module
//!
//! Provides the bounded in-memory response cache with lazy TTL expiry and
//! oldest-first eviction.

mod clock;
mod entry;
mod order;
mod stats;
mod store;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use order::InsertionOrder;
pub use stats::CacheStats;
pub use store::CacheStore;

// == Public Constants ==
/// Maximum number of keyed responses held at once
pub const DEFAULT_CAPACITY: usize = 200;

/// Maximum number of keys reported by the diagnostics endpoint
pub const DIAGNOSTIC_KEY_LIMIT: usize = 20;
