//! API Handlers
//!
//! HTTP request handlers for the search and cache endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::cache::ReadThrough;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    HealthResponse, InvalidateResponse, Podcast, SearchParams, SearchResult, StatsResponse,
};
use crate::search::{SearchBackend, SearchService};

/// Application state shared across all handlers.
///
/// Cloning is cheap: everything inside is reference counted.
#[derive(Clone)]
pub struct AppState {
    /// Cached search operations
    pub search: SearchService,
}

impl AppState {
    /// Creates a new AppState around a search service.
    pub fn new(search: SearchService) -> Self {
        Self { search }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Builds the cache with the configured capacity and compute timeout.
    pub fn from_config(config: &Config, backend: Arc<dyn SearchBackend>) -> Self {
        let cache =
            ReadThrough::in_memory(config.max_entries).with_compute_timeout(config.compute_timeout());
        Self::new(SearchService::new(cache, backend, config.search_ttl()))
    }

    /// The read-through cache behind the search service.
    pub fn cache(&self) -> &ReadThrough {
        self.search.cache()
    }
}

/// Handler for GET /api/search?q=
///
/// Searches channels and podcasts.
pub async fn search_all_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResult>> {
    let result = state.search.search_all(&params.q).await?;
    Ok(Json(result))
}

/// Handler for GET /api/search/channel/:id?q=
///
/// Searches the podcasts of one channel. A non-numeric id names no channel
/// and answers 404; a numeric id with no podcasts answers an empty list.
pub async fn search_channel_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Podcast>>> {
    let channel_id: i64 = id
        .parse()
        .map_err(|_| CacheError::NotFound(format!("channel {}", id)))?;
    let podcasts = state.search.search_channel(channel_id, &params.q).await?;
    Ok(Json(podcasts))
}

/// Handler for GET /api/search/bookmarks?q=&user_id=
///
/// Searches a user's bookmarked podcasts.
pub async fn search_bookmarks_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Podcast>>> {
    let user_id = params.require_user().map_err(CacheError::InvalidRequest)?;
    let podcasts = state.search.search_bookmarks(user_id, &params.q).await?;
    Ok(Json(podcasts))
}

/// Handler for DELETE /cache/:key
///
/// Drops a cached result so the next request recomputes it.
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<InvalidateResponse>> {
    if state.cache().invalidate(&key)? {
        Ok(Json(InvalidateResponse::new(key)))
    } else {
        Err(CacheError::NotFound(key))
    }
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.cache();
    Json(StatsResponse::new(&cache.store().stats(), &cache.stats()))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
