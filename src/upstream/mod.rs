//! Upstream Module
//!
//! Outbound access to the KCDB chat-statistics API.
//!
//! The proxy only ever needs "GET this path with these parameters and parse
//! the JSON body", so that is the whole seam. `HttpUpstream` is the real
//! client, and tests plug in fakes behind the same trait.

mod http;

pub use http::HttpUpstream;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Upstream message query endpoint.
pub const MESSAGES_PATH: &str = "/api/messages";

/// Upstream aggregate statistics endpoint.
pub const STATS_PATH: &str = "/api/stats";

// == Upstream Trait ==
/// Read-only JSON source.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Issues one GET for `path` with `params` as the query string.
    ///
    /// The call is aborted once `timeout` elapses. Implementations map
    /// failures onto the proxy's error kinds:
    /// - non-success status → `ProxyError::UpstreamStatus`
    /// - deadline elapsed → `ProxyError::UpstreamTimeout`
    /// - anything else, including malformed JSON → `ProxyError::UpstreamUnreachable`
    async fn get_json(
        &self,
        path: &str,
        params: &[(String, String)],
        timeout: Duration,
    ) -> Result<Value>;
}

/// Type alias for a shared upstream handle
pub type SharedUpstream = Arc<dyn Upstream>;
