//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::DEFAULT_CAPACITY;
use crate::proxy::UpstreamTimeouts;

/// Default upstream API root.
pub const DEFAULT_UPSTREAM_URL: &str = "https://kcdb.amcalledglitchy.dev";

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Upstream API root, without trailing slash
    pub upstream_url: String,
    /// Directory holding the dashboard assets
    pub static_dir: PathBuf,
    /// Maximum number of keyed responses cached
    pub cache_capacity: usize,
    /// Deadline for forwarded message queries, in seconds
    pub messages_timeout_secs: u64,
    /// Deadline for each stats fetch, in seconds
    pub stats_timeout_secs: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `PORT` - HTTP server port (default: 2764)
    /// - `UPSTREAM_URL` - Upstream API root (default: KCDB production)
    /// - `STATIC_DIR` - Dashboard asset directory (default: public)
    /// - `CACHE_CAPACITY` - Maximum cached responses (default: 200)
    /// - `MESSAGES_TIMEOUT_SECS` - Message query deadline (default: 30)
    /// - `STATS_TIMEOUT_SECS` - Stats fetch deadline (default: 10)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parse_var("PORT").unwrap_or(defaults.server_port),
            upstream_url: env::var("UPSTREAM_URL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or(defaults.upstream_url),
            static_dir: env::var("STATIC_DIR")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            cache_capacity: parse_var("CACHE_CAPACITY").unwrap_or(defaults.cache_capacity),
            messages_timeout_secs: parse_var("MESSAGES_TIMEOUT_SECS")
                .unwrap_or(defaults.messages_timeout_secs),
            stats_timeout_secs: parse_var("STATS_TIMEOUT_SECS")
                .unwrap_or(defaults.stats_timeout_secs),
        }
    }

    /// Upstream deadlines as durations.
    pub fn timeouts(&self) -> UpstreamTimeouts {
        UpstreamTimeouts {
            messages: Duration::from_secs(self.messages_timeout_secs),
            stats: Duration::from_secs(self.stats_timeout_secs),
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 2764,
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            static_dir: PathBuf::from("public"),
            cache_capacity: DEFAULT_CAPACITY,
            messages_timeout_secs: 30,
            stats_timeout_secs: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 2764);
        assert_eq!(config.upstream_url, DEFAULT_UPSTREAM_URL);
        assert_eq!(config.static_dir, PathBuf::from("public"));
        assert_eq!(config.cache_capacity, 200);
        assert_eq!(config.timeouts(), UpstreamTimeouts::default());
    }

    #[test]
    fn test_config_from_env() {
        // Single test touching the environment, so no cross-test races.
        env::remove_var("PORT");
        env::remove_var("UPSTREAM_URL");
        env::remove_var("STATIC_DIR");
        env::remove_var("CACHE_CAPACITY");
        env::remove_var("MESSAGES_TIMEOUT_SECS");
        env::remove_var("STATS_TIMEOUT_SECS");
        assert_eq!(Config::from_env(), Config::default());

        env::set_var("PORT", "8080");
        env::set_var("UPSTREAM_URL", "http://localhost:9000/");
        env::set_var("CACHE_CAPACITY", "not-a-number");
        env::set_var("STATS_TIMEOUT_SECS", "3");

        let config = Config::from_env();
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.upstream_url, "http://localhost:9000");
        assert_eq!(config.cache_capacity, 200);
        assert_eq!(config.timeouts().stats, Duration::from_secs(3));

        env::remove_var("PORT");
        env::remove_var("UPSTREAM_URL");
        env::remove_var("CACHE_CAPACITY");
        env::remove_var("STATS_TIMEOUT_SECS");
    }
}
