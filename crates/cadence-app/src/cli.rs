//! CLI argument definitions for the Cadence server.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use cadence_core::config::CadenceConfig;

/// Cadence - an in-memory song embedding store with similarity search.
#[derive(Parser, Debug)]
#[command(name = "cadence", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Interface to bind the API server to.
    #[arg(long = "host")]
    pub host: Option<String>,

    /// API server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Embedding dimension every song must match.
    #[arg(long = "embedding-dim")]
    pub embedding_dim: Option<usize>,

    /// Base URL of the tracks service used for bulk import.
    #[arg(long = "tracks-url")]
    pub tracks_url: Option<String>,

    /// gRPC target (`host:port`) of the tracks service. Wins over --tracks-url.
    #[arg(long = "grpc-target")]
    pub grpc_target: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > CADENCE_CONFIG env var > ~/.cadence/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("CADENCE_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Overwrite config values with any flags given on the command line.
    ///
    /// Call after env overrides so flags take precedence.
    pub fn apply_to(&self, config: &mut CadenceConfig) {
        if let Some(ref host) = self.host {
            config.general.host = host.clone();
        }
        if let Some(port) = self.port.filter(|p| *p > 0) {
            config.general.port = port;
        }
        if let Some(dim) = self.embedding_dim.filter(|d| *d > 0) {
            config.store.embedding_dim = dim;
        }
        if let Some(ref url) = self.tracks_url {
            config.fetcher.base_url = Some(url.clone());
        }
        if let Some(ref target) = self.grpc_target {
            config.fetcher.grpc_target = Some(target.clone());
        }
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".cadence").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".cadence").join("config.toml");
    }
    PathBuf::from("config.toml")
}
