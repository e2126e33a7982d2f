//! Error types for track fetching and the import saga.

use cadence_core::error::CadenceError;

/// Errors from the external track-features service.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Track service request failed: {0}")]
    Request(String),
    #[error("Track service returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Track service response could not be decoded: {0}")]
    Decode(String),
    #[error("Track service unavailable: {0}")]
    Unavailable(String),
}

/// Errors that abort an import.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// Nothing was inserted.
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),
    /// Inserts from this run were rolled back.
    ///
    /// `imported` and `failed` describe the run up to the abort; every id in
    /// `imported` has since been removed from the store.
    #[error("Insert failed for track {track_id} ({rolled_back} rolled back): {source}")]
    Insert {
        track_id: String,
        #[source]
        source: CadenceError,
        rolled_back: usize,
        imported: Vec<String>,
        failed: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        let err = FetchError::Status {
            status: 503,
            message: "down for maintenance".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Track service returned 503: down for maintenance"
        );
    }

    #[test]
    fn test_import_error_from_fetch() {
        let err: ImportError = FetchError::Request("connection refused".to_string()).into();
        assert!(matches!(err, ImportError::Fetch(_)));
        assert_eq!(
            err.to_string(),
            "Fetch failed: Track service request failed: connection refused"
        );
    }

    #[test]
    fn test_insert_error_display() {
        let err = ImportError::Insert {
            track_id: "t3".to_string(),
            source: CadenceError::DimensionMismatch {
                expected: 12,
                actual: 2,
            },
            rolled_back: 1,
            imported: vec!["t1".to_string()],
            failed: vec!["t2".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Insert failed for track t3 (1 rolled back): Embedding dimension mismatch: expected 12, got 2"
        );
    }
}
