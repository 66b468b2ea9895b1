//! API Handlers
//!
//! HTTP request handlers for each proxy endpoint.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};

use crate::cache::{CacheStore, DIAGNOSTIC_KEY_LIMIT};
use crate::config::Config;
use crate::error::Result;
use crate::models::{CacheStatsResponse, ClearResponse};
use crate::proxy::{CacheStatus, ProxyService, QueryParams, CACHE_HEADER};
use crate::upstream::HttpUpstream;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Cache-fronted upstream access
    pub proxy: Arc<ProxyService>,
    /// Directory the dashboard is served from
    pub static_dir: PathBuf,
}

impl AppState {
    /// Creates a new AppState around an already built proxy service.
    pub fn new(proxy: ProxyService, static_dir: impl Into<PathBuf>) -> Self {
        Self {
            proxy: Arc::new(proxy),
            static_dir: static_dir.into(),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Wires a real HTTP upstream, a wall-clock cache of the configured
    /// capacity, and the configured timeouts.
    pub fn from_config(config: &Config) -> Result<Self> {
        let upstream = HttpUpstream::new(config.upstream_url.clone())?;
        let cache = CacheStore::new(config.cache_capacity);
        let proxy =
            ProxyService::new(cache, Arc::new(upstream)).with_timeouts(config.timeouts());
        Ok(Self::new(proxy, config.static_dir.clone()))
    }
}

/// Attaches the `X-Cache` header to a response body.
fn with_cache_header(status: CacheStatus, body: impl IntoResponse) -> Response {
    ([(CACHE_HEADER, status.as_str())], body).into_response()
}

/// Handler for GET /api/messages
///
/// Forwards the filter set upstream, or answers from cache.
pub async fn messages_handler(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response> {
    let params = QueryParams::from_pairs(pairs);
    let fetched = state.proxy.messages(&params).await?;

    Ok(with_cache_header(fetched.status, Json(fetched.value)))
}

/// Handler for GET /api/stats
pub async fn stats_handler(State(state): State<AppState>) -> Result<Response> {
    let fetched = state.proxy.stats().await?;

    Ok(with_cache_header(fetched.status, Json(fetched.value)))
}

/// Handler for GET /api/cache-stats
///
/// Diagnostic view of the keyed cache.
pub async fn cache_stats_handler(State(state): State<AppState>) -> Json<CacheStatsResponse> {
    let cache = state.proxy.cache().read().await;

    Json(CacheStatsResponse::new(
        &cache.stats(),
        cache.capacity(),
        cache.keys(DIAGNOSTIC_KEY_LIMIT),
    ))
}

/// Handler for POST /api/cache-clear
pub async fn cache_clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    state.proxy.clear_cache().await;
    Json(ClearResponse::ok())
}
