//! API Routes
//!
//! Configures the Axum router with the proxy endpoints and the dashboard.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use super::handlers::{
    cache_clear_handler, cache_stats_handler, messages_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /api/messages` - Cached upstream message query
/// - `GET /api/stats` - Dashboard stats snapshot
/// - `GET /api/cache-stats` - Cache diagnostics
/// - `POST /api/cache-clear` - Drop every cached response
/// - anything else - Dashboard assets, falling back to `index.html`
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let dashboard = ServeDir::new(&state.static_dir)
        .fallback(ServeFile::new(state.static_dir.join("index.html")));

    Router::new()
        .route("/api/messages", get(messages_handler))
        .route("/api/stats", get(stats_handler))
        .route("/api/cache-stats", get(cache_stats_handler))
        .route("/api/cache-clear", post(cache_clear_handler))
        .fallback_service(dashboard)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
