//! Response models for the proxy server API
//!
//! DTOs serialized into the bodies of the diagnostic and error responses.
//! Proxied upstream documents and the stats snapshot are passed through as-is.

pub mod responses;

// Re-export commonly used types
pub use responses::{CacheStatsResponse, ClearResponse, ErrorResponse};
