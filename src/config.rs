//! Matching configuration.
//!
//! Settings can come from a JSON file and from command-line flags; flags win.
//! Every field of the file is optional:
//!
//! ```json
//! {
//!   "comparator": { "size_tolerance": 0.9, "content_similarity_threshold": 0.95, "chunk_bytes": 8192 },
//!   "on_unreadable": "skip",
//!   "exclude_self": true
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default minimum `min_size / max_size` ratio for two files to be compared by content
pub const DEFAULT_SIZE_TOLERANCE: f64 = 0.90;

/// Default minimum `matching_bytes / max_size` ratio for two files to be similar
pub const DEFAULT_CONTENT_SIMILARITY_THRESHOLD: f64 = 0.95;

/// Default number of bytes read from each file per step of the content scan
pub const DEFAULT_CHUNK_BYTES: usize = 8192;

/// Upper bound on the chunk size; each comparison allocates two buffers of this size
pub const MAX_CHUNK_BYTES: usize = 64 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Thresholds and buffer size for the similarity comparator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComparatorConfig {
    /// Minimum `min_size / max_size`; below this the files are not read at all
    pub size_tolerance: f64,
    /// Minimum `matching_bytes / max_size` for a similar verdict
    pub content_similarity_threshold: f64,
    /// Bytes read from each file per scan step
    pub chunk_bytes: usize,
}

impl Default for ComparatorConfig {
    fn default() -> Self {
        Self {
            size_tolerance: DEFAULT_SIZE_TOLERANCE,
            content_similarity_threshold: DEFAULT_CONTENT_SIMILARITY_THRESHOLD,
            chunk_bytes: DEFAULT_CHUNK_BYTES,
        }
    }
}

impl ComparatorConfig {
    /// Check that ratios lie in `[0, 1]` and the chunk size is usable.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` describing the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_ratio("size_tolerance", self.size_tolerance)?;
        check_ratio(
            "content_similarity_threshold",
            self.content_similarity_threshold,
        )?;

        if self.chunk_bytes == 0 {
            return Err(ConfigError::Invalid(
                "chunk_bytes must be greater than 0".to_string(),
            ));
        }
        if self.chunk_bytes > MAX_CHUNK_BYTES {
            return Err(ConfigError::Invalid(format!(
                "chunk_bytes must be at most {MAX_CHUNK_BYTES}, got {}",
                self.chunk_bytes
            )));
        }

        Ok(())
    }
}

fn check_ratio(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{name} must be between 0 and 1, got {value}"
        )))
    }
}

/// What to do when a comparison fails with an I/O error
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum UnreadablePolicy {
    /// Stop the whole run and report the error
    #[default]
    Abort,
    /// Log the error, treat the candidate as not matching, keep scanning
    Skip,
}

/// Settings for a full matching run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatchConfig {
    pub comparator: ComparatorConfig,
    pub on_unreadable: UnreadablePolicy,
    /// Never match a query against a candidate that is the same file on disk
    pub exclude_self: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            comparator: ComparatorConfig::default(),
            on_unreadable: UnreadablePolicy::default(),
            exclude_self: true,
        }
    }
}

impl MatchConfig {
    /// Load settings from a JSON file. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Read` if the file cannot be read, `ConfigError::Parse`
    /// for malformed JSON or unknown fields, or `ConfigError::Invalid` if a value
    /// is out of range.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse settings from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` or `ConfigError::Invalid`.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the comparator settings are out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.comparator.validate()
    }
}
