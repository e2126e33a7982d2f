//! Request and response bodies.
//!
//! Responses never carry embeddings; only ids, metadata, and scores leave
//! the server.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use cadence_core::types::{Metadata, SearchResult, Song};

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct InsertRequest {
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

/// Similarity search by raw embedding.
///
/// `k` is signed on the wire: zero or negative means the default.
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub k: Option<i64>,
    #[serde(default)]
    pub filter: Option<HashMap<String, String>>,
}

/// Similarity search starting from a stored song.
#[derive(Debug, Deserialize)]
pub struct SearchByIdRequest {
    pub id: String,
    #[serde(default)]
    pub k: Option<i64>,
    #[serde(default)]
    pub filter: Option<HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
pub struct ImportRequestBody {
    pub track_ids: Vec<String>,
    /// `"first"` or a song id.
    #[serde(default)]
    pub find_similar_to: Option<String>,
    #[serde(default)]
    pub k: Option<i64>,
}

/// Positive `k` values only; anything else falls back to the configured default.
pub fn requested_k(k: Option<i64>) -> Option<usize> {
    k.filter(|k| *k > 0).map(|k| usize::try_from(k).unwrap_or(usize::MAX))
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct InsertResponse {
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SongResponse {
    pub id: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: Metadata,
}

impl From<&Song> for SongResponse {
    fn from(song: &Song) -> Self {
        Self {
            id: song.id.clone(),
            metadata: song.metadata.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResultItem {
    pub id: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: Metadata,
    pub score: f32,
}

impl From<&SearchResult> for SearchResultItem {
    fn from(result: &SearchResult) -> Self {
        Self {
            id: result.song.id.clone(),
            metadata: result.song.metadata.clone(),
            score: result.score,
        }
    }
}

pub fn to_items(results: &[SearchResult]) -> Vec<SearchResultItem> {
    results.iter().map(SearchResultItem::from).collect()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResultItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImportResponse {
    pub imported: Vec<String>,
    pub failed: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similar: Option<Vec<SearchResultItem>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub song_count: usize,
    pub embedding_dim: usize,
}
