//! API Module
//!
//! HTTP handlers and routing for the proxy server.
//!
//! # Endpoints
//! - `GET /api/messages` - Cached upstream message query
//! - `GET /api/stats` - Dashboard stats snapshot
//! - `GET /api/cache-stats` - Cache diagnostics
//! - `POST /api/cache-clear` - Clear the response cache
//! - everything else - Static dashboard

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
