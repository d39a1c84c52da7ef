//! Configuration for recognition and data loading.
//!
//! Plain serde structs with defaults, loadable from JSON. Missing fields take
//! their default so partial configuration files are accepted.

use crate::error::Result;
use crate::io::IOLimits;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Master configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinviewConfig {
    /// Data source limits.
    pub io: IOConfig,
    /// Recognition engine behavior.
    pub recognition: RecognitionOptions,
    /// Caller-side time bounds.
    pub timeout: TimeoutOptions,
}

impl BinviewConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a JSON configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading configuration");
        let text = std::fs::read_to_string(path).map_err(crate::io::error::IoError::from)?;
        Self::from_json_str(&text)
    }
}

/// I/O configuration for data sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IOConfig {
    /// Maximum file size accepted by `open_file` (default: 512MB).
    pub max_file_size: u64,
}

impl Default for IOConfig {
    fn default() -> Self {
        Self {
            max_file_size: IOLimits::default().max_file_size,
        }
    }
}

impl IOConfig {
    pub fn limits(&self) -> IOLimits {
        IOLimits {
            max_file_size: self.max_file_size,
        }
    }
}

/// Recognition engine options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionOptions {
    /// Offer deprecated view types during auto-recognition (default: false).
    pub include_deprecated: bool,
    /// Retry with `create` when a type's `parse` declines (default: false).
    /// A view built this way is reported, finalized and announced as created.
    pub parse_falls_back_to_create: bool,
    /// Attach architecture/platform from bindings after construction (default: true).
    pub resolve_platform: bool,
}

impl Default for RecognitionOptions {
    fn default() -> Self {
        Self {
            include_deprecated: false,
            parse_falls_back_to_create: false,
            resolve_platform: true,
        }
    }
}

/// Caller-side time bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutOptions {
    /// Bound for a single recognition run in seconds (default: 60).
    pub recognition_seconds: u64,
}

impl Default for TimeoutOptions {
    fn default() -> Self {
        Self {
            recognition_seconds: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BinviewConfig::default();
        assert_eq!(config.io.max_file_size, 512 * 1024 * 1024);
        assert!(!config.recognition.include_deprecated);
        assert!(!config.recognition.parse_falls_back_to_create);
        assert!(config.recognition.resolve_platform);
        assert_eq!(config.timeout.recognition_seconds, 60);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            BinviewConfig::from_json_str(r#"{"recognition": {"include_deprecated": true}}"#)
                .unwrap();
        assert!(config.recognition.include_deprecated);
        assert!(config.recognition.resolve_platform);
        assert_eq!(config.io, IOConfig::default());
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = BinviewConfig::default();
        config.io.max_file_size = 1024;
        config.timeout.recognition_seconds = 5;
        let json = config.to_json_string().unwrap();
        assert_eq!(BinviewConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(BinviewConfig::from_json_str("{not json").is_err());
    }

    #[test]
    fn test_limits_from_config() {
        let io = IOConfig { max_file_size: 10 };
        assert_eq!(io.limits().max_file_size, 10);
    }
}
