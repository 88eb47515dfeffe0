//! Response DTOs for the search API
//!
//! Defines the structure of outgoing HTTP response bodies that are not
//! catalog records.

use serde::Serialize;

use crate::cache::{CacheStats, CoordinatorStats};

/// Response body for cache invalidation (DELETE /cache/:key)
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    /// Success message
    pub message: String,
    /// The key that was invalidated
    pub key: String,
}

impl InvalidateResponse {
    /// Creates a new InvalidateResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' invalidated", key),
            key,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Entries dropped after going stale
    pub expirations: u64,
    /// Number of evictions
    pub evictions: u64,
    /// Current number of entries in cache
    pub total_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Fallback computations run
    pub computations: u64,
    /// Calls served by waiting on another caller's computation
    pub coalesced: u64,
    /// Computations that failed
    pub failures: u64,
    /// Computations currently running
    pub in_flight: usize,
}

impl StatsResponse {
    /// Creates a new StatsResponse from store and coordinator statistics
    pub fn new(store: &CacheStats, coordinator: &CoordinatorStats) -> Self {
        Self {
            hits: store.hits,
            misses: store.misses,
            expirations: store.expirations,
            evictions: store.evictions,
            total_entries: store.total_entries,
            hit_rate: store.hit_rate(),
            computations: coordinator.computations,
            coalesced: coordinator.coalesced,
            failures: coordinator.failures,
            in_flight: coordinator.in_flight,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
