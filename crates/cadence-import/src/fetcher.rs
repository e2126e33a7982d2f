//! Track fetcher trait and implementations.
//!
//! - `HttpTrackFetcher` calls the track-features service over HTTP.
//! - `GrpcTrackFetcher` (in [`crate::grpc`]) calls the same service over gRPC.
//! - `MockTrackFetcher` serves canned tracks for tests and local demos.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use cadence_core::types::Metadata;

use crate::error::FetchError;

/// A track as returned by the track-features service.
///
/// An empty `embedding` means the service has no features for the track.
/// Absent and `null` fields both decode as empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackWithFeatures {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub embedding: Vec<f32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: Metadata,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl TrackWithFeatures {
    pub fn new(id: impl Into<String>, embedding: Vec<f32>, metadata: Metadata) -> Self {
        Self {
            id: id.into(),
            embedding,
            metadata,
        }
    }

    /// A track the service knows nothing about.
    pub fn missing(id: impl Into<String>) -> Self {
        Self::new(id, Vec::new(), Metadata::new())
    }

    pub fn has_embedding(&self) -> bool {
        !self.embedding.is_empty()
    }
}

/// Source of track embeddings for the import saga.
#[async_trait]
pub trait TrackFetcher: Send + Sync {
    /// Fetch every requested track in one call.
    ///
    /// Either the whole call succeeds or it fails; there is no partial result.
    async fn fetch_tracks(&self, track_ids: &[String]) -> Result<Vec<TrackWithFeatures>, FetchError>;
}

#[async_trait]
impl<T: TrackFetcher + ?Sized> TrackFetcher for Arc<T> {
    async fn fetch_tracks(&self, track_ids: &[String]) -> Result<Vec<TrackWithFeatures>, FetchError> {
        (**self).fetch_tracks(track_ids).await
    }
}

// ---------------------------------------------------------------------------
// HttpTrackFetcher
// ---------------------------------------------------------------------------

/// Wire shape of `GET /api/v1/tracks/with-features`.
#[derive(Debug, Deserialize)]
struct TracksResponse {
    #[serde(default)]
    tracks: Vec<TrackWithFeatures>,
}

#[derive(Debug, Default, Deserialize)]
struct ServiceErrorBody {
    #[serde(default)]
    error: String,
}

/// HTTP client for the track-features service.
#[derive(Debug, Clone)]
pub struct HttpTrackFetcher {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTrackFetcher {
    /// Create a client for the service at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Unavailable(format!("HTTP client: {}", e)))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl TrackFetcher for HttpTrackFetcher {
    async fn fetch_tracks(&self, track_ids: &[String]) -> Result<Vec<TrackWithFeatures>, FetchError> {
        if track_ids.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/v1/tracks/with-features", self.base_url);
        debug!(url = %url, count = track_ids.len(), "Fetching tracks");

        let resp = self
            .client
            .get(&url)
            .query(&[("ids", track_ids.join(","))])
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body: ServiceErrorBody = resp.json().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                message: body.error,
            });
        }

        let body: TracksResponse = resp
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;
        Ok(body.tracks)
    }
}

// ---------------------------------------------------------------------------
// MockTrackFetcher
// ---------------------------------------------------------------------------

/// In-memory fetcher serving a fixed catalog.
///
/// Unknown ids come back without an embedding. Counts calls so tests can
/// check that a saga fetches exactly once.
#[derive(Debug, Default)]
pub struct MockTrackFetcher {
    catalog: HashMap<String, TrackWithFeatures>,
    failure: Option<String>,
    calls: AtomicUsize,
}

impl MockTrackFetcher {
    pub fn new(tracks: impl IntoIterator<Item = TrackWithFeatures>) -> Self {
        Self {
            catalog: tracks.into_iter().map(|t| (t.id.clone(), t)).collect(),
            ..Default::default()
        }
    }

    /// A fetcher whose every call fails with a request error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Default::default()
        }
    }

    /// Number of `fetch_tracks` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TrackFetcher for MockTrackFetcher {
    async fn fetch_tracks(&self, track_ids: &[String]) -> Result<Vec<TrackWithFeatures>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(ref message) = self.failure {
            return Err(FetchError::Request(message.clone()));
        }
        Ok(track_ids
            .iter()
            .map(|id| {
                self.catalog
                    .get(id)
                    .cloned()
                    .unwrap_or_else(|| TrackWithFeatures::missing(id.as_str()))
            })
            .collect())
    }
}
