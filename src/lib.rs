//! KCDB Explorer - caching reverse-proxy for the KCDB chat-statistics API
//!
//! Forwards dashboard queries upstream, caches the answers in memory with
//! short query-dependent TTLs, and serves the static dashboard.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod proxy;
pub mod upstream;

pub use api::AppState;
pub use config::Config;
pub use error::{ProxyError, Result};
