//! Configuration file (`reviewlens.yaml`).
//!
//! Looked up in the working directory first, then in the user config
//! directory. Every field has a default, so an absent or partial file is
//! fine.

use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aggregate::DEFAULT_HIGH_COMPLEXITY;
use crate::narrative::{DEFAULT_BASE_URL, DEFAULT_MODEL};

pub const CONFIG_FILE_NAME: &str = "reviewlens.yaml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parsing {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("invalid exclude pattern {pattern:?}: {source}")]
    Glob {
        pattern: String,
        source: globset::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub narrative: NarrativeConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AnalysisConfig {
    /// Worker threads for per-file scans; 0 uses the rayon default.
    #[serde(default)]
    pub workers: usize,
    #[serde(default = "AnalysisConfig::default_high_complexity")]
    pub high_complexity_threshold: u32,
    /// Glob patterns for paths to skip when expanding directories.
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl AnalysisConfig {
    fn default_high_complexity() -> u32 {
        DEFAULT_HIGH_COMPLEXITY
    }

    /// Compile `exclude` into a matcher.
    pub fn exclude_set(&self) -> Result<GlobSet, ConfigError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.exclude {
            let glob = Glob::new(pattern).map_err(|source| ConfigError::Glob {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        builder.build().map_err(|source| ConfigError::Glob {
            pattern: self.exclude.join(", "),
            source,
        })
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            high_complexity_threshold: DEFAULT_HIGH_COMPLEXITY,
            exclude: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NarrativeConfig {
    #[serde(default = "NarrativeConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "NarrativeConfig::default_model")]
    pub model: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "NarrativeConfig::default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "NarrativeConfig::default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "NarrativeConfig::default_diff_excerpt_chars")]
    pub diff_excerpt_chars: usize,
    #[serde(default = "NarrativeConfig::default_max_files")]
    pub max_files: usize,
}

impl NarrativeConfig {
    fn default_base_url() -> String {
        DEFAULT_BASE_URL.to_string()
    }

    fn default_model() -> String {
        DEFAULT_MODEL.to_string()
    }

    fn default_api_key_env() -> String {
        "GEMINI_API_KEY".to_string()
    }

    fn default_timeout_ms() -> u64 {
        60_000
    }

    fn default_diff_excerpt_chars() -> usize {
        500
    }

    fn default_max_files() -> usize {
        20
    }
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            model: Self::default_model(),
            api_key_env: Self::default_api_key_env(),
            timeout_ms: Self::default_timeout_ms(),
            diff_excerpt_chars: Self::default_diff_excerpt_chars(),
            max_files: Self::default_max_files(),
        }
    }
}

impl Config {
    /// Parse a config from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the first config found in `dir` or the user config dir,
    /// falling back to defaults.
    pub fn discover(dir: &Path) -> Result<(Self, Option<PathBuf>), ConfigError> {
        let candidates = std::iter::once(dir.join(CONFIG_FILE_NAME)).chain(
            directories::ProjectDirs::from("", "", "reviewlens")
                .map(|p| p.config_dir().join(CONFIG_FILE_NAME)),
        );
        for candidate in candidates {
            if candidate.is_file() {
                tracing::debug!(path = %candidate.display(), "loading config");
                return Ok((Self::parse_file(&candidate)?, Some(candidate)));
            }
        }
        Ok((Self::default(), None))
    }
}

/// Commented template written by `reviewlens init`.
pub const TEMPLATE: &str = r#"# reviewlens configuration
analysis:
  # Worker threads for per-file scans (0 = one per CPU)
  workers: 0
  # Files above this complexity are listed as high complexity
  high_complexity_threshold: 10
  # Glob patterns skipped when expanding directories
  exclude:
    - "**/node_modules/**"
    - "**/.venv/**"

narrative:
  base_url: "https://generativelanguage.googleapis.com/v1beta/models"
  model: "gemini-1.5-flash"
  # Environment variable holding the API key
  api_key_env: "GEMINI_API_KEY"
  timeout_ms: 60000
  # Characters of each patch embedded in the request
  diff_excerpt_chars: 500
  # Files embedded in a pull-request request
  max_files: 20
"#;
