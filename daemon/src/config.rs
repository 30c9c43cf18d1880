//! Daemon configuration with TOML file support.

use std::path::{Path, PathBuf};

use accord_utils::LogFormat;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(String),
}

/// Configuration for the `accord` binary.
///
/// Loaded from a TOML file via [`DaemonConfig::from_toml_file`] or built
/// from defaults; command-line flags and `ACCORD_*` variables override it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Directory holding the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// LMDB memory map size in MiB. Bounds the database size.
    #[serde(default = "default_map_size_mb")]
    pub map_size_mb: usize,

    #[serde(default = "default_max_dbs")]
    pub max_dbs: u32,

    /// Evidence log path. Defaults to `evidence.jsonl` inside `data_dir`.
    #[serde(default)]
    pub evidence_path: Option<PathBuf>,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./accord_data")
}

fn default_map_size_mb() -> usize {
    64
}

fn default_max_dbs() -> u32 {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl DaemonConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn map_size_bytes(&self) -> usize {
        self.map_size_mb.saturating_mul(1024 * 1024)
    }

    /// The evidence log location, resolved against `data_dir` when unset.
    pub fn evidence_path(&self) -> PathBuf {
        self.evidence_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("evidence.jsonl"))
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            map_size_mb: default_map_size_mb(),
            max_dbs: default_max_dbs(),
            evidence_path: None,
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}
