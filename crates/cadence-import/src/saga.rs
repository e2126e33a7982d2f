//! Bulk import saga.
//!
//! One run is: fetch all requested tracks, insert them in fetch order, and
//! optionally search for songs similar to one of them. A structural insert
//! failure undoes every insert made earlier in the same run. The saga lives
//! only for the duration of one call; nothing is persisted or replayed.

use std::sync::Arc;

use tracing::{debug, info, warn};

use cadence_core::types::{effective_k, SearchResult};
use cadence_vector::VectorStore;

use crate::error::ImportError;
use crate::fetcher::TrackFetcher;

/// Which song the follow-up similarity search starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimilarTarget {
    /// The first track imported by this run.
    First,
    /// A specific song id.
    Id(String),
}

impl SimilarTarget {
    /// Wire value selecting [`SimilarTarget::First`].
    pub const FIRST: &'static str = "first";

    /// Parse the wire form. Empty strings select nothing.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "" => None,
            Self::FIRST => Some(Self::First),
            id => Some(Self::Id(id.to_string())),
        }
    }
}

/// Input to one import run.
#[derive(Debug, Clone, Default)]
pub struct ImportRequest {
    pub track_ids: Vec<String>,
    pub find_similar_to: Option<SimilarTarget>,
    /// Number of similar songs; 0 means the default of 10.
    pub k: usize,
}

/// Result of a completed import.
#[derive(Debug, Clone, Default)]
pub struct ImportOutcome {
    /// Ids stored by this run, in fetch order.
    pub imported: Vec<String>,
    /// Ids the service returned without an embedding.
    pub failed: Vec<String>,
    /// Present only when a follow-up search was requested and could run.
    pub similar: Option<Vec<SearchResult>>,
}

/// Undo action recorded after each successful step.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Compensation {
    DeleteSong(String),
}

/// Orchestrates fetch, insert-with-rollback, and the similarity follow-up.
pub struct ImportSaga<F: TrackFetcher> {
    store: Arc<VectorStore>,
    fetcher: F,
}

impl<F: TrackFetcher> ImportSaga<F> {
    pub fn new(store: Arc<VectorStore>, fetcher: F) -> Self {
        Self { store, fetcher }
    }

    /// Run one import.
    ///
    /// No store lock is held across steps; each insert and delete is its own
    /// store operation.
    pub async fn run(&self, request: ImportRequest) -> Result<ImportOutcome, ImportError> {
        info!(count = request.track_ids.len(), "Import started");

        // Step 1: fetch. Nothing has been written yet, so a failure needs no undo.
        let tracks = self.fetcher.fetch_tracks(&request.track_ids).await?;

        // Step 2: insert, recording an undo for every committed write.
        let mut outcome = ImportOutcome::default();
        let mut compensations: Vec<Compensation> = Vec::with_capacity(tracks.len());

        for track in tracks {
            if !track.has_embedding() {
                warn!(track_id = %track.id, "Track has no embedding, skipping");
                outcome.failed.push(track.id);
                continue;
            }

            match self
                .store
                .insert_with_id(track.id.as_str(), track.embedding, Some(track.metadata))
            {
                Ok(song) => {
                    compensations.push(Compensation::DeleteSong(song.id.clone()));
                    outcome.imported.push(song.id.clone());
                }
                Err(source) => {
                    let rolled_back = self.compensate(compensations);
                    warn!(
                        track_id = %track.id,
                        error = %source,
                        rolled_back,
                        "Import aborted, batch rolled back"
                    );
                    return Err(ImportError::Insert {
                        track_id: track.id,
                        source,
                        rolled_back,
                        imported: outcome.imported,
                        failed: outcome.failed,
                    });
                }
            }
        }

        // Step 3: optional similarity search. Never fails the import.
        outcome.similar = self.find_similar(
            request.find_similar_to.as_ref(),
            &outcome.imported,
            request.k,
        );

        info!(
            imported = outcome.imported.len(),
            failed = outcome.failed.len(),
            similar = outcome.similar.as_ref().map_or(0, Vec::len),
            "Import completed"
        );
        Ok(outcome)
    }

    /// Apply undo actions newest first. Returns how many songs were removed.
    fn compensate(&self, compensations: Vec<Compensation>) -> usize {
        let mut removed = 0;
        for step in compensations.into_iter().rev() {
            match step {
                Compensation::DeleteSong(id) => {
                    let existed = self.store.delete(&id);
                    debug!(song_id = %id, existed, "Compensating insert");
                    if existed {
                        removed += 1;
                    }
                }
            }
        }
        removed
    }

    fn find_similar(
        &self,
        target: Option<&SimilarTarget>,
        imported: &[String],
        k: usize,
    ) -> Option<Vec<SearchResult>> {
        let id = match target? {
            SimilarTarget::First => imported.first()?,
            SimilarTarget::Id(id) => id,
        };

        match self.store.search_by_id(id, effective_k(k), None) {
            Ok(Some(results)) => Some(results),
            Ok(None) => {
                debug!(song_id = %id, "Similarity target not stored, skipping search");
                None
            }
            Err(e) => {
                warn!(song_id = %id, error = %e, "Similarity search failed, skipping");
                None
            }
        }
    }
}
