//! Application state shared across all route handlers.
//!
//! AppState is passed to handlers via axum's State extractor.

use std::sync::Arc;
use std::time::Instant;

use cadence_core::config::CadenceConfig;
use cadence_import::{ImportSaga, TrackFetcher};
use cadence_vector::VectorStore;

/// Import saga over a type-erased fetcher, so tests can plug in a mock.
pub type Importer = ImportSaga<Arc<dyn TrackFetcher>>;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<CadenceConfig>,
    /// The song store.
    pub store: Arc<VectorStore>,
    /// Bulk importer. `None` when no track service is configured.
    pub importer: Option<Arc<Importer>>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Create state without an importer.
    pub fn new(config: CadenceConfig, store: Arc<VectorStore>) -> Self {
        Self {
            config: Arc::new(config),
            store,
            importer: None,
            start_time: Instant::now(),
        }
    }

    /// Enable `/songs/import` using the given fetcher against the same store.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn TrackFetcher>) -> Self {
        self.importer = Some(Arc::new(ImportSaga::new(Arc::clone(&self.store), fetcher)));
        self
    }
}
