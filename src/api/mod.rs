//! API Module
//!
//! HTTP handlers and routing for the search server REST API.
//!
//! # Endpoints
//! - `GET /api/search?q=` - Search channels and podcasts
//! - `GET /api/search/channel/:id?q=` - Search podcasts of a channel
//! - `GET /api/search/bookmarks?q=&user_id=` - Search a user's bookmarks
//! - `DELETE /cache/:key` - Invalidate a cached result
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
