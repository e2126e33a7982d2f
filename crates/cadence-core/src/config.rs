use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{CadenceError, Result};

/// Top-level configuration for the Cadence server.
///
/// Loaded from `~/.cadence/config.toml` by default. Environment variables
/// and CLI flags are layered on top by the binary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CadenceConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
}

impl CadenceConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CadenceConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Reject values the server cannot start with.
    pub fn validate(&self) -> Result<()> {
        if self.store.embedding_dim == 0 {
            return Err(CadenceError::Config(
                "store.embedding_dim must be greater than zero".to_string(),
            ));
        }
        if self.search.default_k == 0 || self.search.max_k == 0 {
            return Err(CadenceError::Config(
                "search.default_k and search.max_k must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply overrides from the process environment.
    ///
    /// `CADENCE_*` names win over the unprefixed names (`EMBEDDING_DIM`,
    /// `PORT`, `SPOTIFY_SEARCH_URL`, `SPOTIFY_GRPC_TARGET`).
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Zero or unparsable numbers are ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |keys: &[&str]| keys.iter().find_map(|k| lookup(k));

        if let Some(dim) = first(&["CADENCE_EMBEDDING_DIM", "EMBEDDING_DIM"])
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|d| *d > 0)
        {
            self.store.embedding_dim = dim;
        }
        if let Some(port) = first(&["CADENCE_PORT", "PORT"])
            .and_then(|v| v.parse::<u16>().ok())
            .filter(|p| *p > 0)
        {
            self.general.port = port;
        }
        if let Some(url) = first(&["CADENCE_TRACKS_URL", "SPOTIFY_SEARCH_URL"])
            .filter(|u| !u.trim().is_empty())
        {
            self.fetcher.base_url = Some(url);
        }
        if let Some(target) = first(&["CADENCE_GRPC_TARGET", "SPOTIFY_GRPC_TARGET"])
            .filter(|t| !t.trim().is_empty())
        {
            self.fetcher.grpc_target = Some(target);
        }
    }
}

/// General server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Interface to bind the HTTP server to.
    pub host: String,
    /// HTTP server port.
    pub port: u16,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
        }
    }
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Fixed embedding dimension for every stored song.
    pub embedding_dim: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        // One slot per track audio feature.
        Self { embedding_dim: 12 }
    }
}

/// Search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Number of results when a request omits `k`.
    pub default_k: usize,
    /// Upper bound applied to any requested `k`.
    pub max_k: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_k: 10,
            max_k: 1000,
        }
    }
}

impl SearchConfig {
    /// Resolve a requested `k`: missing or zero becomes `default_k`, anything
    /// else is capped at `max_k`.
    pub fn resolve_k(&self, requested: Option<usize>) -> usize {
        match requested {
            Some(k) if k > 0 => k.min(self.max_k),
            _ => self.default_k,
        }
    }
}

/// External track-features service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Base URL of the tracks service over HTTP.
    pub base_url: Option<String>,
    /// `host:port` of the tracks service over gRPC. Wins over `base_url`.
    /// Import is disabled when neither is set.
    pub grpc_target: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            grpc_target: None,
            timeout_secs: 10,
        }
    }
}
