//! Request DTOs for the search API
//!
//! Defines the query parameters accepted by the search endpoints.

use serde::Deserialize;

/// Query string for the search endpoints (`?q=...&user_id=...`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    /// Raw search text, normalized before use
    #[serde(default)]
    pub q: String,
    /// Owner of the bookmarks being searched
    #[serde(default)]
    pub user_id: Option<i64>,
}

impl SearchParams {
    /// Returns the user id, or an error message when it is missing.
    pub fn require_user(&self) -> Result<i64, String> {
        self.user_id
            .ok_or_else(|| "user_id is required for bookmark search".to_string())
    }
}
