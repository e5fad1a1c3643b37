//! Engine configuration.
//!
//! Everything tunable about an ingestion run in one serde struct: the static
//! exclusion policy, the content-size ceiling, concurrency and depth limits,
//! timeouts and the optional API token. Loadable from a TOML file; the token
//! can also come from the environment so it never has to live on disk.

use crate::error::IngestError;
use crate::filter::ExclusionPolicy;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Files above this byte size get a sentinel instead of being fetched.
fn default_max_file_size() -> u64 {
    512 * 1024
}

/// Simultaneous in-flight content fetches during assembly.
fn default_max_concurrent() -> usize {
    8
}

/// Hard ceiling on directory nesting for both the local walk and the remote
/// fallback listing.
fn default_max_depth() -> usize {
    50
}

fn default_request_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Static default-exclusion lists plus the virtual-env opt-in.
    #[serde(default)]
    pub policy: ExclusionPolicy,

    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// GitHub bearer token. Prefer `REPOGEST_GITHUB_TOKEN` / `GITHUB_TOKEN`
    /// over putting this in a file.
    #[serde(default)]
    pub github_token: Option<String>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            policy: ExclusionPolicy::default(),
            max_file_size: default_max_file_size(),
            max_concurrent: default_max_concurrent(),
            max_depth: default_max_depth(),
            request_timeout_secs: default_request_timeout_secs(),
            github_token: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl IngestConfig {
    /// Load from a TOML file, then apply environment overrides.
    pub fn load_from_file(path: &Path) -> Result<Self, IngestError> {
        let text = std::fs::read_to_string(path).map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: IngestConfig = toml::from_str(&text)
            .map_err(|e| IngestError::Config(format!("failed to parse {}: {}", path.display(), e)))?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        if self.github_token.is_none() {
            self.github_token = std::env::var("REPOGEST_GITHUB_TOKEN")
                .ok()
                .or_else(|| std::env::var("GITHUB_TOKEN").ok())
                .filter(|t| !t.is_empty());
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
