//! HTTP Upstream
//!
//! reqwest-backed implementation of [`Upstream`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::ACCEPT, Client};
use serde_json::Value;
use tracing::{debug, warn};

use super::Upstream;
use crate::error::{ProxyError, Result};

// == HTTP Upstream ==
/// Talks to the real upstream over HTTP.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: Client,
    base_url: String,
}

impl HttpUpstream {
    /// Creates a client for `base_url`. A trailing slash is trimmed.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("kcdb-explorer/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProxyError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(client, base_url))
    }

    /// Wraps an existing reqwest client.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn get_json(
        &self,
        path: &str,
        params: &[(String, String)],
        timeout: Duration,
    ) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, params = params.len(), "Fetching from upstream");

        let response = self
            .client
            .get(&url)
            .query(params)
            .header(ACCEPT, "application/json")
            .timeout(timeout)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "Upstream returned non-success status");
            return Err(ProxyError::UpstreamStatus {
                status: status.as_u16(),
                message: format!("Upstream returned {}", status.as_u16()),
            });
        }

        response.json::<Value>().await.map_err(map_transport_error)
    }
}

/// Maps a reqwest failure onto timeout or generic unreachable.
fn map_transport_error(err: reqwest::Error) -> ProxyError {
    if err.is_timeout() {
        warn!(error = %err, "Upstream request timed out");
        ProxyError::UpstreamTimeout
    } else {
        warn!(error = %err, "Upstream request failed");
        ProxyError::UpstreamUnreachable(err.to_string())
    }
}
