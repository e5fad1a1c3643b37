//! Logging system.
//!
//! Structured logging via the `tracing` crate: configurable level, text or
//! JSON format, and stderr / stdout / file destinations. The `REPOGEST_LOG`
//! environment variable takes precedence over file configuration and accepts
//! full `EnvFilter` directives.

use crate::error::IngestError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_output() -> String {
    // The assembled artifact goes to stdout, so diagnostics default to stderr.
    "stderr".to_string()
}

fn default_true() -> bool {
    true
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Whether logging is enabled (default: true).
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level: trace, debug, info, warn, error, off.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: json, text.
    #[serde(default = "default_format")]
    pub format: String,

    /// Output destination: stdout, stderr, file.
    #[serde(default = "default_output")]
    pub output: String,

    /// Log file path when output is `file`; None means the platform state
    /// directory.
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Colored output (text format, terminal destinations only).
    #[serde(default = "default_true")]
    pub color: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            level: default_log_level(),
            format: default_format(),
            output: default_output(),
            file: None,
            color: default_true(),
        }
    }
}

/// Default log file location under the platform state directory.
fn default_log_file_path() -> Result<PathBuf, IngestError> {
    let project_dirs = directories::ProjectDirs::from("", "repogest", "repogest").ok_or_else(
        || IngestError::Config("could not determine platform state directory".to_string()),
    )?;
    let dir = project_dirs
        .state_dir()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| project_dirs.cache_dir().to_path_buf());
    Ok(dir.join("repogest.log"))
}

fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_env("REPOGEST_LOG") {
        return filter;
    }
    EnvFilter::new(config.level.as_str())
}

fn open_log_file(config: &LoggingConfig) -> Result<std::fs::File, IngestError> {
    let path = match &config.file {
        Some(p) => p.clone(),
        None => default_log_file_path()?,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            IngestError::Config(format!("failed to create log directory: {}", e))
        })?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| IngestError::Config(format!("failed to open log file {:?}: {}", path, e)))
}

/// Initialize the global tracing subscriber. Call once at process start.
pub fn init_logging(config: &LoggingConfig) -> Result<(), IngestError> {
    if !config.enabled {
        Registry::default()
            .with(EnvFilter::new("off"))
            .with(fmt::layer().with_writer(std::io::sink))
            .init();
        return Ok(());
    }

    let filter = build_env_filter(config);
    let base = Registry::default().with(filter);
    let json = match config.format.as_str() {
        "json" => true,
        "text" => false,
        other => {
            return Err(IngestError::Config(format!(
                "invalid log format: {} (must be 'json' or 'text')",
                other
            )))
        }
    };

    match config.output.as_str() {
        "file" => {
            let writer = open_log_file(config)?;
            if json {
                base.with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(ChronoUtc::rfc_3339())
                        .with_writer(writer),
                )
                .init();
            } else {
                base.with(
                    fmt::layer()
                        .with_target(true)
                        .with_timer(ChronoUtc::rfc_3339())
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .init();
            }
        }
        "stdout" => {
            if json {
                base.with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(ChronoUtc::rfc_3339())
                        .with_writer(std::io::stdout),
                )
                .init();
            } else {
                base.with(
                    fmt::layer()
                        .with_target(true)
                        .with_timer(ChronoUtc::rfc_3339())
                        .with_ansi(config.color)
                        .with_writer(std::io::stdout),
                )
                .init();
            }
        }
        "stderr" => {
            if json {
                base.with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(ChronoUtc::rfc_3339())
                        .with_writer(std::io::stderr),
                )
                .init();
            } else {
                base.with(
                    fmt::layer()
                        .with_target(true)
                        .with_timer(ChronoUtc::rfc_3339())
                        .with_ansi(config.color)
                        .with_writer(std::io::stderr),
                )
                .init();
            }
        }
        other => {
            return Err(IngestError::Config(format!(
                "invalid log output: {} (must be 'stdout', 'stderr', or 'file')",
                other
            )))
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_logging_config() {
        let config = LoggingConfig::default();
        assert!(config.enabled);
        assert_eq!(config.level, "info");
        assert_eq!(config.format, "text");
        assert_eq!(config.output, "stderr");
        assert_eq!(config.file, None);
        assert!(config.color);
    }

    #[test]
    fn test_invalid_format_is_rejected() {
        let config = LoggingConfig {
            format: "xml".to_string(),
            ..LoggingConfig::default()
        };
        // Validation happens before any subscriber is installed.
        let err = init_logging(&config).unwrap_err();
        assert!(err.to_string().contains("invalid log format"));
    }

    #[test]
    fn test_default_log_file_path_ends_with_crate_log() {
        let path = default_log_file_path().unwrap();
        assert!(path.ends_with("repogest.log"));
    }
}
