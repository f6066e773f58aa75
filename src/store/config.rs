//! Store configuration
//!
//! Size thresholds used by the reader. Every field has a default, so an
//! empty JSON object is a valid configuration file:
//!
//! ```json
//! {
//!   "baseline_buffer_size": 65536,
//!   "large_buffer_multiple": 16,
//!   "max_record_length": 2147483647
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default read buffer size class, 64 KiB
pub const DEFAULT_BASELINE_BUFFER_SIZE: usize = 64 * 1024;

/// Default multiple of the baseline above which a buffer is not retained
pub const DEFAULT_LARGE_BUFFER_MULTIPLE: usize = 16;

/// Default exclusive upper bound on a record length
pub const DEFAULT_MAX_RECORD_LENGTH: u32 = i32::MAX as u32;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Reader thresholds for a framed file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Initial read buffer capacity and the chunk size growth rounds up to
    #[serde(default = "default_baseline_buffer_size")]
    pub baseline_buffer_size: usize,

    /// Buffers above `baseline_buffer_size * large_buffer_multiple` are
    /// released after use
    #[serde(default = "default_large_buffer_multiple")]
    pub large_buffer_multiple: usize,

    /// Length prefixes at or above this value are treated as corruption
    #[serde(default = "default_max_record_length")]
    pub max_record_length: u32,
}

fn default_baseline_buffer_size() -> usize {
    DEFAULT_BASELINE_BUFFER_SIZE
}
fn default_large_buffer_multiple() -> usize {
    DEFAULT_LARGE_BUFFER_MULTIPLE
}
fn default_max_record_length() -> u32 {
    DEFAULT_MAX_RECORD_LENGTH
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            baseline_buffer_size: DEFAULT_BASELINE_BUFFER_SIZE,
            large_buffer_multiple: DEFAULT_LARGE_BUFFER_MULTIPLE,
            max_record_length: DEFAULT_MAX_RECORD_LENGTH,
        }
    }
}

impl StoreConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: StoreConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate field ranges
    pub fn validate(&self) -> ConfigResult<()> {
        if self.baseline_buffer_size == 0 {
            return Err(ConfigError::Invalid {
                field: "baseline_buffer_size",
                reason: "must be > 0".to_string(),
            });
        }

        if self.large_buffer_multiple == 0 {
            return Err(ConfigError::Invalid {
                field: "large_buffer_multiple",
                reason: "must be >= 1".to_string(),
            });
        }

        if self
            .baseline_buffer_size
            .checked_mul(self.large_buffer_multiple)
            .is_none()
        {
            return Err(ConfigError::Invalid {
                field: "large_buffer_multiple",
                reason: "large buffer threshold overflows usize".to_string(),
            });
        }

        if self.max_record_length == 0 {
            return Err(ConfigError::Invalid {
                field: "max_record_length",
                reason: "must be > 0".to_string(),
            });
        }

        Ok(())
    }

    /// Capacity above which the read buffer is released after use
    pub fn large_buffer_threshold(&self) -> usize {
        self.baseline_buffer_size
            .saturating_mul(self.large_buffer_multiple)
    }
}
