//! Core domain types shared across all Cadence crates.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Free-form string tags attached to a song (genre, artist, mood, ...).
pub type Metadata = HashMap<String, String>;

/// Number of results returned when a caller asks for `k = 0`.
pub const DEFAULT_K: usize = 10;

/// A track with its embedding and metadata.
///
/// Songs are immutable once stored. The store hands out `Arc<Song>` so
/// search results and lookups share the canonical copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: String,
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Song {
    pub fn new(id: impl Into<String>, embedding: Vec<f32>, metadata: Option<Metadata>) -> Self {
        Self {
            id: id.into(),
            embedding,
            metadata: metadata.unwrap_or_default(),
        }
    }
}

/// A song paired with its similarity to the query.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub song: Arc<Song>,
    pub score: f32,
}

/// Replace `k = 0` with [`DEFAULT_K`].
pub fn effective_k(k: usize) -> usize {
    if k == 0 {
        DEFAULT_K
    } else {
        k
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_song_new_normalizes_missing_metadata() {
        let song = Song::new("a", vec![1.0, 2.0], None);
        assert_eq!(song.id, "a");
        assert!(song.metadata.is_empty());
    }

    #[test]
    fn test_song_deserialize_without_metadata() {
        let song: Song = serde_json::from_str(r#"{"id":"x","embedding":[0.5]}"#).unwrap();
        assert_eq!(song.embedding, vec![0.5]);
        assert!(song.metadata.is_empty());
    }

    #[test]
    fn test_effective_k() {
        assert_eq!(effective_k(0), DEFAULT_K);
        assert_eq!(effective_k(3), 3);
    }
}
