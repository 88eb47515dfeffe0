//! API Routes
//!
//! Configures the Axum router with all search server endpoints.

use axum::{
    routing::{delete, get},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    health_handler, invalidate_handler, search_all_handler, search_bookmarks_handler,
    search_channel_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /api/search?q=` - Search channels and podcasts
/// - `GET /api/search/channel/:id?q=` - Search podcasts of a channel
/// - `GET /api/search/bookmarks?q=&user_id=` - Search a user's bookmarks
/// - `DELETE /cache/:key` - Invalidate a cached result
/// - `GET /stats` - Get cache statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/search", get(search_all_handler))
        .route("/api/search/channel/:id", get(search_channel_handler))
        .route("/api/search/bookmarks", get(search_bookmarks_handler))
        .route("/cache/:key", delete(invalidate_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
