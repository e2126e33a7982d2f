//! Cadence application binary - composition root.
//!
//! 1. Parse CLI flags and load configuration (file, then env, then flags)
//! 2. Initialize tracing
//! 3. Build the song store and, when a tracks service is configured, the importer
//! 4. Start the axum REST API server

mod cli;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use cadence_api::{start_server, AppState};
use cadence_core::config::{CadenceConfig, FetcherConfig};
use cadence_import::{FetchError, GrpcTrackFetcher, HttpTrackFetcher, TrackFetcher};
use cadence_vector::VectorStore;

use crate::cli::CliArgs;

/// Which transport reaches the tracks service.
#[derive(Debug, PartialEq, Eq)]
enum FetcherBackend {
    Grpc(String),
    Http(String),
}

impl FetcherBackend {
    /// gRPC wins when both are configured. Blank values count as unset.
    fn from_config(config: &FetcherConfig) -> Option<Self> {
        let set = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
        };
        set(&config.grpc_target)
            .map(FetcherBackend::Grpc)
            .or_else(|| set(&config.base_url).map(FetcherBackend::Http))
    }

    fn build(&self, timeout: Duration) -> Result<Arc<dyn TrackFetcher>, FetchError> {
        let fetcher: Arc<dyn TrackFetcher> = match self {
            FetcherBackend::Grpc(target) => Arc::new(GrpcTrackFetcher::new(target, timeout)?),
            FetcherBackend::Http(url) => Arc::new(HttpTrackFetcher::new(url, timeout)?),
        };
        Ok(fetcher)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = CadenceConfig::load_or_default(&config_file);
    config.apply_env_overrides();
    args.apply_to(&mut config);
    config.validate()?;

    // Tracing. RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting Cadence v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    let store = Arc::new(VectorStore::new(config.store.embedding_dim));
    tracing::info!(dimension = store.dimension(), "Song store initialized");

    let mut state = AppState::new(config.clone(), Arc::clone(&store));

    match FetcherBackend::from_config(&config.fetcher) {
        Some(backend) => {
            let timeout = Duration::from_secs(config.fetcher.timeout_secs);
            state = state.with_fetcher(backend.build(timeout)?);
            tracing::info!(backend = ?backend, "Bulk import enabled");
        }
        None => tracing::info!("No tracks service configured, bulk import disabled"),
    }

    start_server(&config, state).await?;

    Ok(())
}
