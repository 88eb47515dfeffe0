//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// Freshness duration in seconds for cached search results
    pub search_ttl: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Background sweep interval in seconds, 0 disables the sweep
    pub cleanup_interval: u64,
    /// Upper bound in seconds on a single search computation, 0 means unbounded
    pub compute_timeout: u64,
    /// Optional JSON catalog loaded into the in-memory search backend
    pub catalog_path: Option<String>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum cache entries (default: 10000)
    /// - `SEARCH_CACHE_TTL` - Search result freshness in seconds (default: 1800)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 60)
    /// - `COMPUTE_TIMEOUT` - Computation timeout in seconds (default: 0, none)
    /// - `CATALOG_PATH` - Catalog JSON file (default: unset)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: env_or("MAX_ENTRIES", defaults.max_entries),
            search_ttl: env_or("SEARCH_CACHE_TTL", defaults.search_ttl),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            compute_timeout: env_or("COMPUTE_TIMEOUT", defaults.compute_timeout),
            catalog_path: env::var("CATALOG_PATH").ok().filter(|p| !p.is_empty()),
        }
    }

    /// Search result freshness as a Duration.
    pub fn search_ttl(&self) -> Duration {
        Duration::from_secs(self.search_ttl)
    }

    /// Computation timeout, if one is configured.
    pub fn compute_timeout(&self) -> Option<Duration> {
        (self.compute_timeout > 0).then(|| Duration::from_secs(self.compute_timeout))
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            search_ttl: 30 * 60,
            server_port: 3000,
            cleanup_interval: 60,
            compute_timeout: 0,
            catalog_path: None,
        }
    }
}
