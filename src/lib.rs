//! Search Cache - podcast search backend with a read-through result cache
//!
//! Search results are cached per normalized query; concurrent misses for the
//! same query share a single computation.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod search;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheKey, MemoryStore, PayloadStore, ReadThrough};
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::spawn_cleanup_task;
