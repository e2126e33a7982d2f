//! In-memory song store with brute-force cosine similarity search.
//!
//! Every search scans the whole collection, O(songs x dimension). All
//! embeddings share the dimension fixed at construction.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;
use uuid::Uuid;

use cadence_core::error::CadenceError;
use cadence_core::types::{effective_k, Metadata, SearchResult, Song};

use crate::filter::MetadataFilter;
use crate::similarity::cosine_similarity;

/// Parameters for a KNN search.
#[derive(Clone, Copy)]
pub struct SearchParams<'a> {
    /// Query embedding. Must match the store dimension.
    pub query: &'a [f32],
    /// Maximum number of results; 0 means the default of 10.
    pub k: usize,
    /// Songs the filter rejects are neither scored nor returned.
    pub filter: Option<&'a dyn MetadataFilter>,
}

impl<'a> SearchParams<'a> {
    pub fn new(query: &'a [f32]) -> Self {
        Self {
            query,
            k: 0,
            filter: None,
        }
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_filter(mut self, filter: &'a dyn MetadataFilter) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// Thread-safe song store keyed by song id.
///
/// Writes (insert, delete) take the lock exclusively; reads (get, count,
/// search) share it. A search sees one consistent snapshot for its whole
/// scan.
#[derive(Debug)]
pub struct VectorStore {
    songs: RwLock<HashMap<String, Arc<Song>>>,
    dimension: usize,
}

impl VectorStore {
    /// Create an empty store accepting embeddings of exactly `dimension` values.
    pub fn new(dimension: usize) -> Self {
        Self {
            songs: RwLock::new(HashMap::new()),
            dimension,
        }
    }

    /// The fixed embedding dimension.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Insert a song under a freshly generated id.
    pub fn insert(
        &self,
        embedding: Vec<f32>,
        metadata: Option<Metadata>,
    ) -> Result<Arc<Song>, CadenceError> {
        self.check_dimension(&embedding)?;
        Ok(self.put(Uuid::new_v4().to_string(), embedding, metadata))
    }

    /// Insert a song under a caller-supplied id.
    ///
    /// Overwrites any existing song with the same id.
    pub fn insert_with_id(
        &self,
        id: impl Into<String>,
        embedding: Vec<f32>,
        metadata: Option<Metadata>,
    ) -> Result<Arc<Song>, CadenceError> {
        self.check_dimension(&embedding)?;
        Ok(self.put(id.into(), embedding, metadata))
    }

    /// Look up a song by id.
    pub fn get(&self, id: &str) -> Option<Arc<Song>> {
        self.read().get(id).cloned()
    }

    /// Remove a song. Returns true if it existed.
    pub fn delete(&self, id: &str) -> bool {
        let removed = self.write().remove(id).is_some();
        if removed {
            debug!(song_id = %id, "Song deleted");
        }
        removed
    }

    /// Number of stored songs.
    pub fn count(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Find the `k` songs most similar to the query, best first.
    ///
    /// Order among songs with equal scores is unspecified.
    pub fn search(&self, params: SearchParams<'_>) -> Result<Vec<SearchResult>, CadenceError> {
        self.check_dimension(params.query)?;
        let k = effective_k(params.k);

        let songs = self.read();
        let mut results: Vec<SearchResult> = songs
            .values()
            .filter(|song| {
                params
                    .filter
                    .map_or(true, |filter| filter.matches(&song.metadata))
            })
            .map(|song| SearchResult {
                song: Arc::clone(song),
                score: cosine_similarity(params.query, &song.embedding),
            })
            .collect();
        drop(songs);

        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(k);
        Ok(results)
    }

    /// Find the `k` songs most similar to an already stored song.
    ///
    /// The song itself is excluded. Returns `None` if `id` is not stored.
    pub fn search_by_id(
        &self,
        id: &str,
        k: usize,
        filter: Option<&dyn MetadataFilter>,
    ) -> Result<Option<Vec<SearchResult>>, CadenceError> {
        let Some(song) = self.get(id) else {
            return Ok(None);
        };
        let k = effective_k(k);

        let params = SearchParams {
            query: &song.embedding,
            k: k.saturating_add(1),
            filter,
        };
        let mut results = self.search(params)?;
        results.retain(|r| r.song.id != id);
        results.truncate(k);
        Ok(Some(results))
    }

    fn check_dimension(&self, embedding: &[f32]) -> Result<(), CadenceError> {
        if embedding.len() != self.dimension {
            return Err(CadenceError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }
        Ok(())
    }

    fn put(&self, id: String, embedding: Vec<f32>, metadata: Option<Metadata>) -> Arc<Song> {
        let song = Arc::new(Song::new(id, embedding, metadata));
        let replaced = self
            .write()
            .insert(song.id.clone(), Arc::clone(&song))
            .is_some();
        debug!(song_id = %song.id, replaced, "Song stored");
        song
    }

    // Every write is a single map operation, so a poisoned lock still
    // guards a consistent map.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<Song>>> {
        self.songs.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<Song>>> {
        self.songs.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::KeyValueFilter;

    const DIM: usize = 4;

    fn meta(pairs: &[(&str, &str)]) -> Metadata {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn seeded_store() -> VectorStore {
        let store = VectorStore::new(DIM);
        store
            .insert_with_id("a", vec![1.0, 0.0, 0.0, 0.0], Some(meta(&[("genre", "rock")])))
            .unwrap();
        store
            .insert_with_id("b", vec![0.9, 0.1, 0.0, 0.0], Some(meta(&[("genre", "jazz")])))
            .unwrap();
        store
            .insert_with_id("c", vec![0.0, 1.0, 0.0, 0.0], Some(meta(&[("genre", "rock")])))
            .unwrap();
        store
            .insert_with_id("d", vec![-1.0, 0.0, 0.0, 0.0], None)
            .unwrap();
        store
    }

    #[test]
    fn test_insert_and_get() {
        let store = VectorStore::new(DIM);
        let song = store
            .insert(vec![1.0, 2.0, 3.0, 4.0], Some(meta(&[("artist", "Björk")])))
            .unwrap();

        let fetched = store.get(&song.id).unwrap();
        assert_eq!(fetched.embedding, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(fetched.metadata, meta(&[("artist", "Björk")]));
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_insert_normalizes_missing_metadata() {
        let store = VectorStore::new(DIM);
        let song = store.insert(vec![1.0; DIM], None).unwrap();
        assert!(store.get(&song.id).unwrap().metadata.is_empty());
    }

    #[test]
    fn test_insert_generates_unique_ids() {
        let store = VectorStore::new(DIM);
        let a = store.insert(vec![1.0; DIM], None).unwrap();
        let b = store.insert(vec![1.0; DIM], None).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.count(), 2);
    }

    #[test]
    fn test_insert_dimension_mismatch_does_not_mutate() {
        let store = seeded_store();
        let before = store.count();

        let err = store.insert(vec![1.0; DIM + 1], None).unwrap_err();
        assert!(matches!(
            err,
            CadenceError::DimensionMismatch {
                expected: DIM,
                actual: 5
            }
        ));
        let err = store.insert_with_id("a", vec![], None).unwrap_err();
        assert!(err.is_validation());

        assert_eq!(store.count(), before);
        assert_eq!(store.get("a").unwrap().embedding, vec![1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_insert_with_id_overwrites() {
        let store = VectorStore::new(DIM);
        store
            .insert_with_id("x", vec![1.0; DIM], Some(meta(&[("v", "1")])))
            .unwrap();
        let count_after_first = store.count();
        store
            .insert_with_id("x", vec![2.0; DIM], Some(meta(&[("v", "2")])))
            .unwrap();

        assert_eq!(store.count(), count_after_first);
        let song = store.get("x").unwrap();
        assert_eq!(song.embedding, vec![2.0; DIM]);
        assert_eq!(song.metadata, meta(&[("v", "2")]));
    }

    #[test]
    fn test_delete() {
        let store = seeded_store();
        assert!(store.delete("a"));
        assert!(store.get("a").is_none());
        assert_eq!(store.count(), 3);
    }

    #[test]
    fn test_delete_nonexistent() {
        let store = seeded_store();
        assert!(!store.delete("missing"));
        assert_eq!(store.count(), 4);
    }

    #[test]
    fn test_search_empty_store() {
        let store = VectorStore::new(DIM);
        let results = store.search(SearchParams::new(&[1.0; DIM])).unwrap();
        assert!(results.is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_search_ordering() {
        let store = seeded_store();
        let query = [1.0, 0.0, 0.0, 0.0];
        let results = store.search(SearchParams::new(&query).with_k(10)).unwrap();

        assert_eq!(results.len(), 4);
        let ids: Vec<&str> = results.iter().map(|r| r.song.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
        assert!((results[0].score - 1.0).abs() < 1e-6);
        assert!((results[3].score + 1.0).abs() < 1e-6);
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_search_respects_k() {
        let store = seeded_store();
        let results = store
            .search(SearchParams::new(&[1.0, 0.0, 0.0, 0.0]).with_k(2))
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].song.id, "a");
    }

    #[test]
    fn test_search_zero_k_uses_default() {
        let store = VectorStore::new(DIM);
        for _ in 0..15 {
            store.insert(vec![1.0; DIM], None).unwrap();
        }
        let results = store.search(SearchParams::new(&[1.0; DIM])).unwrap();
        assert_eq!(results.len(), 10);
    }

    #[test]
    fn test_search_with_filter() {
        let store = seeded_store();
        let filter = KeyValueFilter::default().with("genre", "rock");
        let results = store
            .search(SearchParams::new(&[1.0, 0.0, 0.0, 0.0]).with_filter(&filter))
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results
            .iter()
            .all(|r| r.song.metadata.get("genre").map(String::as_str) == Some("rock")));
        assert_eq!(results[0].song.id, "a");
    }

    #[test]
    fn test_search_with_closure_filter() {
        let store = seeded_store();
        let untagged = |m: &Metadata| m.is_empty();
        let results = store
            .search(SearchParams::new(&[1.0, 0.0, 0.0, 0.0]).with_filter(&untagged))
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].song.id, "d");
    }

    #[test]
    fn test_search_dimension_mismatch() {
        let store = seeded_store();
        let err = store.search(SearchParams::new(&[1.0, 0.0])).unwrap_err();
        assert!(matches!(err, CadenceError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_search_ties_return_correct_set() {
        let store = VectorStore::new(DIM);
        for id in ["t1", "t2", "t3"] {
            store.insert_with_id(id, vec![1.0; DIM], None).unwrap();
        }
        store.insert_with_id("far", vec![-1.0; DIM], None).unwrap();

        let results = store
            .search(SearchParams::new(&[1.0; DIM]).with_k(3))
            .unwrap();
        let mut ids: Vec<&str> = results.iter().map(|r| r.song.id.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["t1", "t2", "t3"]);
    }

    #[test]
    fn test_search_by_id_excludes_self() {
        let store = seeded_store();
        let results = store.search_by_id("a", 2, None).unwrap().unwrap();

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.song.id != "a"));
        assert_eq!(results[0].song.id, "b");
    }

    #[test]
    fn test_search_by_id_unknown() {
        let store = seeded_store();
        assert!(store.search_by_id("nope", 5, None).unwrap().is_none());
    }

    #[test]
    fn test_search_by_id_max_k_returns_everything_else() {
        let store = seeded_store();
        let results = store.search_by_id("a", usize::MAX, None).unwrap().unwrap();

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.song.id != "a"));
        assert_eq!(results[0].song.id, "b");
    }

    #[test]
    fn test_search_by_id_with_filter() {
        let store = seeded_store();
        let filter = KeyValueFilter::default().with("genre", "rock");
        let results = store.search_by_id("a", 10, Some(&filter)).unwrap().unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.song.id.as_str()).collect();
        assert_eq!(ids, vec!["c"]);
    }

    #[test]
    fn test_concurrent_readers_and_writers() {
        let store = VectorStore::new(DIM);
        std::thread::scope(|s| {
            for t in 0..4 {
                let store = &store;
                s.spawn(move || {
                    for i in 0..50 {
                        store
                            .insert_with_id(format!("{t}-{i}"), vec![1.0, t as f32, i as f32, 0.5], None)
                            .unwrap();
                    }
                });
            }
            for _ in 0..4 {
                let store = &store;
                s.spawn(move || {
                    for _ in 0..50 {
                        let results = store
                            .search(SearchParams::new(&[1.0; DIM]).with_k(5))
                            .unwrap();
                        assert!(results.len() <= 5);
                        for pair in results.windows(2) {
                            assert!(pair[0].score >= pair[1].score);
                        }
                    }
                });
            }
        });
        assert_eq!(store.count(), 200);
    }
}
