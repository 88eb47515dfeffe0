//! Search Service
//!
//! Search operations behind the HTTP handlers. Shared queries go through the
//! read-through cache; per-user bookmark searches always hit the backend.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::debug;

use crate::cache::{normalize_query, CacheKey, ReadThrough, MAX_QUERY_LENGTH};
use crate::error::{CacheError, Result};
use crate::models::{Podcast, SearchResult};
use crate::search::SearchBackend;

#[derive(Clone)]
pub struct SearchService {
    cache: ReadThrough,
    backend: Arc<dyn SearchBackend>,
    ttl: Duration,
}

impl SearchService {
    /// Creates a service caching results for `ttl`.
    pub fn new(cache: ReadThrough, backend: Arc<dyn SearchBackend>, ttl: Duration) -> Self {
        Self {
            cache,
            backend,
            ttl,
        }
    }

    pub fn cache(&self) -> &ReadThrough {
        &self.cache
    }

    // == Search All ==
    /// Channels and podcasts matching `raw_query`.
    ///
    /// A blank query returns an empty result without touching the cache or
    /// the backend.
    pub async fn search_all(&self, raw_query: &str) -> Result<SearchResult> {
        let mut result = SearchResult::default();
        let query = checked_query(raw_query)?;
        let Some(key) = CacheKey::search_all(&query) else {
            debug!("Blank query, skipping search");
            return Ok(result);
        };

        let backend = Arc::clone(&self.backend);
        self.cache
            .get_or_compute(key.as_str(), self.ttl, &mut result, || async move {
                let channels = backend
                    .search_channels(&query)
                    .await
                    .context("searching channels")?;
                let podcasts = backend
                    .search_podcasts(&query)
                    .await
                    .context("searching podcasts")?;
                Ok(SearchResult { channels, podcasts })
            })
            .await?;

        Ok(result)
    }

    // == Search Channel ==
    /// Podcasts of one channel matching `raw_query`.
    pub async fn search_channel(&self, channel_id: i64, raw_query: &str) -> Result<Vec<Podcast>> {
        let mut podcasts = Vec::new();
        let query = checked_query(raw_query)?;
        let Some(key) = CacheKey::search_channel(channel_id, &query) else {
            return Ok(podcasts);
        };

        let backend = Arc::clone(&self.backend);
        self.cache
            .get_or_compute(key.as_str(), self.ttl, &mut podcasts, || async move {
                backend
                    .search_podcasts_by_channel(channel_id, &query)
                    .await
                    .with_context(|| format!("searching podcasts of channel {}", channel_id))
            })
            .await?;

        Ok(podcasts)
    }

    // == Search Bookmarks ==
    /// Bookmarked podcasts of `user_id` matching `raw_query`. Never cached.
    pub async fn search_bookmarks(&self, user_id: i64, raw_query: &str) -> Result<Vec<Podcast>> {
        let query = checked_query(raw_query)?;
        if query.is_empty() {
            return Ok(Vec::new());
        }

        self.backend
            .search_bookmarked_podcasts(user_id, &query)
            .await
            .context("searching bookmarked podcasts")
            .map_err(CacheError::compute)
    }
}

/// Normalizes a query and rejects one too long to key a cache entry.
fn checked_query(raw_query: &str) -> Result<String> {
    let query = normalize_query(raw_query);
    if query.len() > MAX_QUERY_LENGTH {
        return Err(CacheError::InvalidRequest(format!(
            "Query exceeds maximum length of {} bytes",
            MAX_QUERY_LENGTH
        )));
    }
    Ok(query)
}
