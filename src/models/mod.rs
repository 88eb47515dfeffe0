//! Catalog records and HTTP DTOs
//!
//! Typed search results plus the request/response bodies of the API.

pub mod catalog;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use catalog::{Channel, Podcast, SearchResult};
pub use requests::SearchParams;
pub use responses::{ErrorResponse, HealthResponse, InvalidateResponse, StatsResponse};
