//! Search Module
//!
//! Backing search capability plus the cached search operations built on it.

mod backend;
mod service;

pub use backend::{Bookmark, Catalog, MemoryCatalog, SearchBackend, MAX_RESULTS};
pub use service::SearchService;
