//! Cadence Import crate - bulk import of tracks from the external
//! track-features service.
//!
//! The [`ImportSaga`] fetches tracks through a [`TrackFetcher`], inserts
//! them into the shared store with compensating rollback on structural
//! failure, and can chain a similarity search onto the freshly imported
//! data.

pub mod error;
pub mod fetcher;
pub mod grpc;
pub mod saga;

pub use error::{FetchError, ImportError};
pub use fetcher::{HttpTrackFetcher, MockTrackFetcher, TrackFetcher, TrackWithFeatures};
pub use grpc::GrpcTrackFetcher;
pub use saga::{ImportOutcome, ImportRequest, ImportSaga, SimilarTarget};
