//! Proxy Service
//!
//! The HIT/MISS request lifecycle: derive a key, consult the cache, and on a
//! miss fetch from upstream and store the result.
//!
//! Locks are held only around cache reads and writes, never across an
//! upstream call. Two concurrent misses on the same key therefore both go
//! upstream, and the later write wins. There is no request coalescing.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::query::QueryParams;
use super::stats::{message_results, StatsSlot, StatsSnapshot, RECENT_MESSAGES_LIMIT};
use crate::cache::{CacheStore, Clock};
use crate::error::{ProxyError, Result};
use crate::upstream::{SharedUpstream, MESSAGES_PATH, STATS_PATH};

/// Response header carrying the cache outcome.
pub const CACHE_HEADER: &str = "x-cache";

const NO_PARAMS: &[(String, String)] = &[];

// == Cache Status ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

/// A served value and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub value: T,
    pub status: CacheStatus,
}

impl<T> Fetched<T> {
    pub fn hit(value: T) -> Self {
        Self {
            value,
            status: CacheStatus::Hit,
        }
    }

    pub fn miss(value: T) -> Self {
        Self {
            value,
            status: CacheStatus::Miss,
        }
    }
}

// == Timeouts ==
/// Per-call upstream deadlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpstreamTimeouts {
    /// Message query forwarding
    pub messages: Duration,
    /// Each of the two stats fetches
    pub stats: Duration,
}

impl Default for UpstreamTimeouts {
    fn default() -> Self {
        Self {
            messages: Duration::from_secs(30),
            stats: Duration::from_secs(10),
        }
    }
}

// == Proxy Service ==
pub struct ProxyService {
    cache: Arc<RwLock<CacheStore>>,
    stats_slot: RwLock<StatsSlot>,
    upstream: SharedUpstream,
    clock: Arc<dyn Clock>,
    timeouts: UpstreamTimeouts,
}

impl ProxyService {
    /// Creates a service over `cache` and `upstream` with default timeouts.
    ///
    /// The stats slot shares the cache's time source.
    pub fn new(cache: CacheStore, upstream: SharedUpstream) -> Self {
        Self {
            clock: cache.clock(),
            cache: Arc::new(RwLock::new(cache)),
            stats_slot: RwLock::new(StatsSlot::new()),
            upstream,
            timeouts: UpstreamTimeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: UpstreamTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Shared handle to the keyed cache.
    pub fn cache(&self) -> &Arc<RwLock<CacheStore>> {
        &self.cache
    }

    // == Messages ==
    /// Serves a message query from cache or upstream.
    ///
    /// Failures are never cached.
    pub async fn messages(&self, params: &QueryParams) -> Result<Fetched<Value>> {
        let key = params.cache_key();

        for name in params.unknown_filters() {
            debug!(filter = name, "Forwarding unrecognized filter");
        }

        if let Some(value) = self.cache.write().await.get(&key) {
            debug!(%key, "Cache HIT");
            return Ok(Fetched::hit(value));
        }

        let ttl_class = params.ttl_class();
        debug!(%key, ttl = ttl_class.as_str(), "Cache MISS");

        let value = self
            .upstream
            .get_json(MESSAGES_PATH, params.as_pairs(), self.timeouts.messages)
            .await?;

        self.cache
            .write()
            .await
            .set(key, value.clone(), ttl_class.ttl());

        Ok(Fetched::miss(value))
    }

    // == Stats ==
    /// Serves the dashboard snapshot, refreshing it when stale.
    ///
    /// A refresh runs the aggregate fetch and the recent-activity fetch
    /// concurrently. Only the aggregate fetch is required.
    pub async fn stats(&self) -> Result<Fetched<StatsSnapshot>> {
        if let Some(snapshot) = self.stats_slot.read().await.get(self.clock.now_ms()) {
            debug!("Stats HIT");
            return Ok(Fetched::hit(snapshot));
        }

        let recent_params = [("limit".to_string(), RECENT_MESSAGES_LIMIT.to_string())];
        let (aggregate, recent) = tokio::join!(
            self.upstream
                .get_json(STATS_PATH, NO_PARAMS, self.timeouts.stats),
            self.upstream
                .get_json(MESSAGES_PATH, &recent_params, self.timeouts.stats),
        );

        let aggregate = aggregate.map_err(|e| {
            error!(error = %e, "Stats refresh failed");
            ProxyError::StatsUnavailable(e.to_string())
        })?;

        let recent = match recent {
            Ok(page) => Some(message_results(&page)),
            Err(e) => {
                warn!(error = %e, "Recent activity fetch failed, continuing without it");
                None
            }
        };

        let snapshot = StatsSnapshot::reshape(&aggregate, recent);
        info!(
            top_users = snapshot.top_users.len(),
            recent_messages = snapshot.recent_messages.len(),
            "Stats snapshot refreshed"
        );

        self.stats_slot
            .write()
            .await
            .set(snapshot.clone(), self.clock.now_ms());

        Ok(Fetched::miss(snapshot))
    }

    // == Clear ==
    /// Empties the keyed cache. The stats snapshot is left alone.
    pub async fn clear_cache(&self) {
        let mut cache = self.cache.write().await;
        let dropped = cache.len();
        cache.clear();
        info!(dropped, "Cache cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::upstream::Upstream;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Instant;

    /// Canned upstream that records every call.
    #[derive(Default)]
    struct FakeUpstream {
        calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
        stats_calls: AtomicUsize,
        fail_with: Mutex<Option<u16>>,
        fail_recent: bool,
        /// Applied to every call before answering
        delay: Duration,
        /// Extra delay on the recent-activity call, cut off by its timeout
        recent_delay: Duration,
    }

    impl FakeUpstream {
        fn calls(&self) -> Vec<(String, Vec<(String, String)>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Upstream for FakeUpstream {
        async fn get_json(
            &self,
            path: &str,
            params: &[(String, String)],
            timeout: Duration,
        ) -> Result<Value> {
            let is_recent = path == MESSAGES_PATH
                && params.iter().any(|(k, v)| k == "limit" && v == RECENT_MESSAGES_LIMIT);

            tokio::time::sleep(self.delay).await;
            if is_recent && !self.recent_delay.is_zero() {
                if self.recent_delay > timeout {
                    tokio::time::sleep(timeout).await;
                    return Err(ProxyError::UpstreamTimeout);
                }
                tokio::time::sleep(self.recent_delay).await;
            }

            self.calls
                .lock()
                .unwrap()
                .push((path.to_string(), params.to_vec()));

            if let Some(status) = *self.fail_with.lock().unwrap() {
                return Err(ProxyError::UpstreamStatus {
                    status,
                    message: format!("Upstream returned {}", status),
                });
            }

            match path {
                STATS_PATH => {
                    let n = self.stats_calls.fetch_add(1, Ordering::SeqCst);
                    Ok(json!({
                        "totalMessages": 100 + n,
                        "topUsers": [{ "name": "meow", "count": 5 }, { "name": "", "count": 4 }]
                    }))
                }
                _ if self.fail_recent && is_recent => {
                    Err(ProxyError::UpstreamTimeout)
                }
                _ => Ok(json!({ "results": [{ "id": 1, "user_name": "meow" }], "echo": params.len() })),
            }
        }
    }

    fn service(upstream: Arc<FakeUpstream>) -> (ProxyService, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(5_000_000));
        let cache = CacheStore::with_clock(200, clock.clone());
        let service = ProxyService::new(cache, upstream);
        (service, clock)
    }

    #[tokio::test]
    async fn test_messages_miss_then_hit() {
        let upstream = Arc::new(FakeUpstream::default());
        let (service, _) = service(upstream.clone());
        let params = QueryParams::from_pairs([("user_id", "42")]);

        let first = service.messages(&params).await.unwrap();
        let second = service.messages(&params).await.unwrap();

        assert_eq!(first.status, CacheStatus::Miss);
        assert_eq!(second.status, CacheStatus::Hit);
        assert_eq!(first.value, second.value);
        assert_eq!(upstream.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_messages_forwards_params_in_client_order() {
        let upstream = Arc::new(FakeUpstream::default());
        let (service, _) = service(upstream.clone());
        let params = QueryParams::from_pairs([("user_name", "meow"), ("limit", "5")]);

        service.messages(&params).await.unwrap();

        let calls = upstream.calls();
        assert_eq!(calls[0].0, MESSAGES_PATH);
        assert_eq!(
            calls[0].1,
            vec![
                ("user_name".to_string(), "meow".to_string()),
                ("limit".to_string(), "5".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_messages_reordered_query_hits() {
        let upstream = Arc::new(FakeUpstream::default());
        let (service, _) = service(upstream.clone());

        service
            .messages(&QueryParams::from_pairs([("a", "1"), ("b", "2")]))
            .await
            .unwrap();
        let second = service
            .messages(&QueryParams::from_pairs([("b", "2"), ("a", "1")]))
            .await
            .unwrap();

        assert_eq!(second.status, CacheStatus::Hit);
        assert_eq!(upstream.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_messages_expire_with_ttl_class() {
        let upstream = Arc::new(FakeUpstream::default());
        let (service, clock) = service(upstream.clone());
        let user = QueryParams::from_pairs([("user_id", "42")]);
        let plain = QueryParams::from_pairs([("user_name", "meow")]);

        service.messages(&user).await.unwrap();
        service.messages(&plain).await.unwrap();

        // Past the 30s default TTL, inside the 45s user TTL.
        clock.advance(40_000);

        assert_eq!(service.messages(&user).await.unwrap().status, CacheStatus::Hit);
        assert_eq!(service.messages(&plain).await.unwrap().status, CacheStatus::Miss);
        assert_eq!(upstream.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_upstream_failure_not_cached() {
        let upstream = Arc::new(FakeUpstream::default());
        *upstream.fail_with.lock().unwrap() = Some(503);
        let (service, _) = service(upstream.clone());
        let params = QueryParams::from_pairs([("user_id", "42")]);

        let result = service.messages(&params).await;

        assert!(matches!(result, Err(ProxyError::UpstreamStatus { status: 503, .. })));
        assert!(service.cache().read().await.is_empty());
    }

    #[tokio::test]
    async fn test_clear_cache_forces_refetch() {
        let upstream = Arc::new(FakeUpstream::default());
        let (service, _) = service(upstream.clone());
        let params = QueryParams::new();

        service.messages(&params).await.unwrap();
        service.clear_cache().await;
        let again = service.messages(&params).await.unwrap();

        assert_eq!(again.status, CacheStatus::Miss);
        assert_eq!(upstream.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_stats_cached_for_ttl() {
        let upstream = Arc::new(FakeUpstream::default());
        let (service, clock) = service(upstream.clone());

        let first = service.stats().await.unwrap();
        clock.advance(59_000);
        let second = service.stats().await.unwrap();

        assert_eq!(first.status, CacheStatus::Miss);
        assert_eq!(second.status, CacheStatus::Hit);
        assert_eq!(first.value, second.value);
        assert_eq!(upstream.stats_calls.load(Ordering::SeqCst), 1);

        clock.advance(1_000);
        let third = service.stats().await.unwrap();
        assert_eq!(third.status, CacheStatus::Miss);
        assert_eq!(third.value.total_messages, json!(101));
    }

    #[tokio::test]
    async fn test_stats_fetches_both_sources() {
        let upstream = Arc::new(FakeUpstream::default());
        let (service, _) = service(upstream.clone());

        let stats = service.stats().await.unwrap().value;

        let paths: Vec<String> = upstream.calls().into_iter().map(|(p, _)| p).collect();
        assert!(paths.contains(&STATS_PATH.to_string()));
        assert!(paths.contains(&MESSAGES_PATH.to_string()));
        assert_eq!(stats.recent_messages.len(), 1);
        assert_eq!(stats.top_users.len(), 1);
    }

    #[tokio::test]
    async fn test_stats_fetches_run_concurrently() {
        let upstream = Arc::new(FakeUpstream {
            delay: Duration::from_millis(300),
            ..Default::default()
        });
        let (service, _) = service(upstream.clone());

        let started = Instant::now();
        let stats = service.stats().await.unwrap();
        let elapsed = started.elapsed();

        assert_eq!(stats.status, CacheStatus::Miss);
        assert_eq!(upstream.calls().len(), 2);
        assert!(
            elapsed < Duration::from_millis(550),
            "stats took {:?}, fetches ran one after the other",
            elapsed
        );
    }

    #[tokio::test]
    async fn test_stats_survives_slow_recent_activity() {
        let upstream = Arc::new(FakeUpstream {
            recent_delay: Duration::from_secs(5),
            ..Default::default()
        });
        let (service, _) = service(upstream.clone());
        let service = service.with_timeouts(UpstreamTimeouts {
            messages: Duration::from_secs(30),
            stats: Duration::from_millis(200),
        });

        let started = Instant::now();
        let stats = service.stats().await.unwrap().value;

        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(stats.total_messages, json!(100));
        assert!(stats.recent_messages.is_empty());
    }

    #[tokio::test]
    async fn test_stats_slot_follows_cache_clock() {
        let upstream = Arc::new(FakeUpstream::default());
        let (service, clock) = service(upstream.clone());

        service.stats().await.unwrap();
        clock.advance(60_000);

        assert_eq!(service.stats().await.unwrap().status, CacheStatus::Miss);
        assert_eq!(upstream.stats_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_stats_tolerates_recent_failure() {
        let upstream = Arc::new(FakeUpstream {
            fail_recent: true,
            ..Default::default()
        });
        let (service, _) = service(upstream);

        let stats = service.stats().await.unwrap().value;

        assert!(stats.recent_messages.is_empty());
        assert_eq!(stats.total_messages, json!(100));
    }

    #[tokio::test]
    async fn test_stats_primary_failure_fails() {
        let upstream = Arc::new(FakeUpstream::default());
        *upstream.fail_with.lock().unwrap() = Some(500);
        let (service, _) = service(upstream);

        let result = service.stats().await;
        assert!(matches!(result, Err(ProxyError::StatsUnavailable(_))));
    }

    #[tokio::test]
    async fn test_clear_cache_keeps_stats() {
        let upstream = Arc::new(FakeUpstream::default());
        let (service, _) = service(upstream.clone());

        service.stats().await.unwrap();
        service.clear_cache().await;

        assert_eq!(service.stats().await.unwrap().status, CacheStatus::Hit);
    }
}
