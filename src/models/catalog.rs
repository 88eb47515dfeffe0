//! Catalog records returned by search
//!
//! These are the typed result containers the read-through cache hydrates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A podcast feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Feed URL
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

/// A single episode belonging to a channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Podcast {
    pub id: i64,
    pub channel_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub enclosure_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pub_date: Option<DateTime<Utc>>,
}

/// Combined channel and podcast search result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub channels: Vec<Channel>,
    pub podcasts: Vec<Podcast>,
}

impl SearchResult {
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty() && self.podcasts.is_empty()
    }
}
