//! Search Backend
//!
//! The data capability search handlers compute results from. Relevance
//! ranking belongs to whatever implements this trait.

use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::{Channel, Podcast};

/// Maximum number of rows a single search returns
pub const MAX_RESULTS: usize = 20;

// == Search Backend Trait ==
/// Full-text search over channels and podcasts.
///
/// Queries arrive already normalized (trimmed, lower-cased).
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search_channels(&self, query: &str) -> anyhow::Result<Vec<Channel>>;

    async fn search_podcasts(&self, query: &str) -> anyhow::Result<Vec<Podcast>>;

    async fn search_podcasts_by_channel(
        &self,
        channel_id: i64,
        query: &str,
    ) -> anyhow::Result<Vec<Podcast>>;

    async fn search_bookmarked_podcasts(
        &self,
        user_id: i64,
        query: &str,
    ) -> anyhow::Result<Vec<Podcast>>;
}

// == Catalog ==
/// A user's saved podcast.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bookmark {
    pub user_id: i64,
    pub podcast_id: i64,
}

/// Catalog contents, as loaded from a JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub channels: Vec<Channel>,
    #[serde(default)]
    pub podcasts: Vec<Podcast>,
    #[serde(default)]
    pub bookmarks: Vec<Bookmark>,
}

// == Memory Catalog ==
/// Backend over an in-memory catalog using case-insensitive substring
/// matching on title and description.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    catalog: Catalog,
}

impl MemoryCatalog {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    /// Loads a catalog from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading catalog {}", path.display()))?;
        let catalog = serde_json::from_str(&raw)
            .with_context(|| format!("parsing catalog {}", path.display()))?;
        Ok(Self::new(catalog))
    }

    pub fn channel_count(&self) -> usize {
        self.catalog.channels.len()
    }

    pub fn podcast_count(&self) -> usize {
        self.catalog.podcasts.len()
    }

    fn podcasts_where(&self, query: &str, filter: impl Fn(&Podcast) -> bool) -> Vec<Podcast> {
        self.catalog
            .podcasts
            .iter()
            .filter(|p| filter(p) && text_matches(query, &p.title, &p.description))
            .take(MAX_RESULTS)
            .cloned()
            .collect()
    }
}

fn text_matches(query: &str, title: &str, description: &str) -> bool {
    title.to_lowercase().contains(query) || description.to_lowercase().contains(query)
}

#[async_trait]
impl SearchBackend for MemoryCatalog {
    async fn search_channels(&self, query: &str) -> anyhow::Result<Vec<Channel>> {
        Ok(self
            .catalog
            .channels
            .iter()
            .filter(|c| text_matches(query, &c.title, &c.description))
            .take(MAX_RESULTS)
            .cloned()
            .collect())
    }

    async fn search_podcasts(&self, query: &str) -> anyhow::Result<Vec<Podcast>> {
        Ok(self.podcasts_where(query, |_| true))
    }

    async fn search_podcasts_by_channel(
        &self,
        channel_id: i64,
        query: &str,
    ) -> anyhow::Result<Vec<Podcast>> {
        Ok(self.podcasts_where(query, move |p| p.channel_id == channel_id))
    }

    async fn search_bookmarked_podcasts(
        &self,
        user_id: i64,
        query: &str,
    ) -> anyhow::Result<Vec<Podcast>> {
        let saved: HashSet<i64> = self
            .catalog
            .bookmarks
            .iter()
            .filter(|b| b.user_id == user_id)
            .map(|b| b.podcast_id)
            .collect();
        Ok(self.podcasts_where(query, move |p| saved.contains(&p.id)))
    }
}
