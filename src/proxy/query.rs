//! Query Normalization
//!
//! Turns the inbound filter set into a canonical cache key and picks the TTL
//! class a response for it is cached under.

use std::time::Duration;

use urlencoding::encode;

// == Constants ==
/// Filter names the upstream message endpoint understands.
pub const KNOWN_FILTERS: [&str; 10] = [
    "user_name",
    "user_id",
    "short_id",
    "message",
    "message_contains",
    "message_type",
    "exact_id",
    "since_id",
    "before_id",
    "limit",
];

/// Cache key for a query with no filters. Contains no `=`, so no real query can produce it.
pub const DEFAULT_CACHE_KEY: &str = "__default__";

/// Page size at or above which a query counts as a dashboard load.
pub const DASHBOARD_PAGE_SIZE: i64 = 500;

pub const DEFAULT_TTL: Duration = Duration::from_secs(30);
pub const DASHBOARD_TTL: Duration = Duration::from_secs(60);
pub const USER_TTL: Duration = Duration::from_secs(45);

// == TTL Class ==
/// How long a response stays cached, chosen from the query shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlClass {
    Default,
    Dashboard,
    User,
}

impl TtlClass {
    pub fn ttl(self) -> Duration {
        match self {
            TtlClass::Default => DEFAULT_TTL,
            TtlClass::Dashboard => DASHBOARD_TTL,
            TtlClass::User => USER_TTL,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TtlClass::Default => "default",
            TtlClass::Dashboard => "dashboard",
            TtlClass::User => "user",
        }
    }
}

// == Query Params ==
/// Non-empty query parameters in the order the client sent them.
///
/// Empty values are dropped on construction. A repeated name keeps the
/// position of its first occurrence and the value of its last.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a parameter set from raw name/value pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut params = Self::new();
        for (name, value) in pairs {
            params.insert(name, value);
        }
        params
    }

    /// Adds or replaces a parameter. Empty values are ignored.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let (name, value) = (name.into(), value.into());
        if name.is_empty() || value.is_empty() {
            return;
        }
        match self.pairs.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.pairs.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Parameters in client order, for forwarding upstream.
    pub fn as_pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Names not in [`KNOWN_FILTERS`]. They are still forwarded.
    pub fn unknown_filters(&self) -> impl Iterator<Item = &str> {
        self.pairs
            .iter()
            .map(|(n, _)| n.as_str())
            .filter(|n| !KNOWN_FILTERS.contains(n))
    }

    // == Cache Key ==
    /// Canonical key: `name=value` pairs sorted by name and joined with `&`.
    ///
    /// Names and values are percent-encoded, so a value holding `&` or `=`
    /// cannot collide with a different filter set.
    pub fn cache_key(&self) -> String {
        if self.pairs.is_empty() {
            return DEFAULT_CACHE_KEY.to_string();
        }

        let mut sorted: Vec<&(String, String)> = self.pairs.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));
        sorted
            .iter()
            .map(|(name, value)| format!("{}={}", encode(name), encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }

    // == TTL Class ==
    /// First matching rule wins: single user, then large page, then default.
    pub fn ttl_class(&self) -> TtlClass {
        if self.get("user_id").is_some() || self.get("short_id").is_some() {
            return TtlClass::User;
        }
        let page_size = self.get("limit").and_then(parse_leading_int);
        if matches!(page_size, Some(n) if n >= DASHBOARD_PAGE_SIZE) {
            return TtlClass::Dashboard;
        }
        TtlClass::Default
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

/// Parses the leading integer of `s` the lenient way browsers do:
/// leading whitespace is skipped and trailing garbage ignored ("600abc" is 600).
fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, rest) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    // Out-of-range digits still describe a huge page.
    let magnitude = digits.parse::<i64>().unwrap_or(i64::MAX);
    Some(sign * magnitude)
}
