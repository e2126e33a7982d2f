//! gRPC client for the track-features service.
//!
//! Wire contract (package `spotifysearch`):
//!
//! ```proto
//! service SpotifySearch {
//!   rpc GetTracksWithFeatures(GetTracksWithFeaturesRequest)
//!       returns (GetTracksWithFeaturesResponse);
//! }
//! message GetTracksWithFeaturesRequest { repeated string track_ids = 1; }
//! message TrackWithFeatures {
//!   string id = 1;
//!   repeated float embedding = 2;
//!   map<string, string> metadata = 3;
//! }
//! message GetTracksWithFeaturesResponse { repeated TrackWithFeatures tracks = 1; }
//! ```
//!
//! The messages are declared with `prost` derives and the unary call goes
//! through `tonic::client::Grpc` directly, so no build script is needed.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint};
use tonic::{Code, Status};
use tracing::debug;

use crate::error::FetchError;
use crate::fetcher::{TrackFetcher, TrackWithFeatures};

const GET_TRACKS_WITH_FEATURES: &str = "/spotifysearch.SpotifySearch/GetTracksWithFeatures";

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetTracksWithFeaturesRequest {
    #[prost(string, repeated, tag = "1")]
    pub track_ids: Vec<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct TrackMessage {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(float, repeated, tag = "2")]
    pub embedding: Vec<f32>,
    #[prost(map = "string, string", tag = "3")]
    pub metadata: HashMap<String, String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetTracksWithFeaturesResponse {
    #[prost(message, repeated, tag = "1")]
    pub tracks: Vec<TrackMessage>,
}

impl From<TrackMessage> for TrackWithFeatures {
    fn from(msg: TrackMessage) -> Self {
        TrackWithFeatures::new(msg.id, msg.embedding, msg.metadata)
    }
}

impl From<Status> for FetchError {
    fn from(status: Status) -> Self {
        match status.code() {
            Code::Unavailable => FetchError::Unavailable(status.message().to_string()),
            code => FetchError::Request(format!("{:?}: {}", code, status.message())),
        }
    }
}

/// Track fetcher speaking gRPC over plaintext HTTP/2.
///
/// The channel connects lazily, so construction never blocks on the
/// network; connection failures surface from `fetch_tracks`.
#[derive(Debug, Clone)]
pub struct GrpcTrackFetcher {
    target: String,
    channel: Channel,
}

impl GrpcTrackFetcher {
    /// Create a client for `target`, e.g. `tracks:50051` or `http://tracks:50051`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(target: &str, timeout: Duration) -> Result<Self, FetchError> {
        let target = if target.contains("://") {
            target.to_string()
        } else {
            format!("http://{}", target)
        };
        let endpoint = Endpoint::from_shared(target.clone())
            .map_err(|e| FetchError::Unavailable(format!("Invalid gRPC target {}: {}", target, e)))?
            .timeout(timeout)
            .connect_timeout(timeout);
        Ok(Self {
            target,
            channel: endpoint.connect_lazy(),
        })
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

#[async_trait]
impl TrackFetcher for GrpcTrackFetcher {
    async fn fetch_tracks(&self, track_ids: &[String]) -> Result<Vec<TrackWithFeatures>, FetchError> {
        if track_ids.is_empty() {
            return Ok(Vec::new());
        }
        debug!(target_uri = %self.target, count = track_ids.len(), "Fetching tracks over gRPC");

        let mut grpc = tonic::client::Grpc::new(self.channel.clone());
        grpc.ready()
            .await
            .map_err(|e| FetchError::Unavailable(format!("gRPC channel not ready: {}", e)))?;

        let request = tonic::Request::new(GetTracksWithFeaturesRequest {
            track_ids: track_ids.to_vec(),
        });
        let codec: ProstCodec<GetTracksWithFeaturesRequest, GetTracksWithFeaturesResponse> =
            ProstCodec::default();
        let response = grpc
            .unary(request, PathAndQuery::from_static(GET_TRACKS_WITH_FEATURES), codec)
            .await?;

        Ok(response
            .into_inner()
            .tracks
            .into_iter()
            .map(TrackWithFeatures::from)
            .collect())
    }
}
