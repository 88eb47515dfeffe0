//! Cache Key Module
//!
//! Derives cache keys from a namespace plus normalized query parameters.
//! Identical logical queries always map to the same key.

use std::fmt;

/// Separator between key segments
const SEPARATOR: char = ':';

/// Longest normalized query that still yields a storable key in every
/// search namespace
pub const MAX_QUERY_LENGTH: usize = 200;

// == Query Normalization ==
/// Trims surrounding whitespace and lower-cases a raw search query.
pub fn normalize_query(raw: &str) -> String {
    raw.trim().to_lowercase()
}

// == Cache Key ==
/// Opaque key identifying one cacheable computation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Joins a namespace and its parts, e.g. `search:channel:7:foo`.
    pub fn new<I, P>(namespace: &str, parts: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: fmt::Display,
    {
        let mut key = namespace.to_string();
        for part in parts {
            key.push(SEPARATOR);
            key.push_str(&part.to_string());
        }
        Self(key)
    }

    /// Key for the combined channel and podcast search.
    ///
    /// Returns `None` when the normalized query is blank, which means the
    /// caller must skip the cache entirely.
    pub fn search_all(raw_query: &str) -> Option<Self> {
        let query = normalize_query(raw_query);
        (!query.is_empty()).then(|| Self::new("search:all", [query]))
    }

    /// Key for a podcast search scoped to one channel.
    pub fn search_channel(channel_id: i64, raw_query: &str) -> Option<Self> {
        let query = normalize_query(raw_query);
        (!query.is_empty())
            .then(|| Self::new("search:channel", [channel_id.to_string(), query]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
