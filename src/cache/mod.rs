//! Cache Module
//!
//! Read-through result cache: an expiring payload store plus a coordinator
//! that coalesces concurrent computations for the same key.

pub mod codec;
mod coordinator;
mod entry;
mod key;
mod slot;
mod stats;
mod store;


// Re-export public types
pub use coordinator::ReadThrough;
pub use entry::CacheEntry;
pub use key::{normalize_query, CacheKey, MAX_QUERY_LENGTH};
pub use stats::{CacheStats, CoordinatorStats};
pub use store::{MemoryStore, PayloadStore};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed payload size in bytes
pub const MAX_PAYLOAD_SIZE: usize = 1024 * 1024; // 1 MB
