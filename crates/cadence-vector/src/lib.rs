//! Cadence Vector crate - cosine similarity, metadata filters, and the
//! in-memory song store.
//!
//! Provides a brute-force k-nearest-neighbor search over a fixed-dimension
//! collection guarded by a single reader/writer lock.

pub mod filter;
pub mod similarity;
pub mod store;

pub use filter::{KeyValueFilter, MetadataFilter, PrefixFilter};
pub use similarity::cosine_similarity;
pub use store::{SearchParams, VectorStore};
