//! Error types for the binview crate.
//!
//! Declination (a type not matching, an unknown binding name) is never an
//! error here; it is reported as `None`/`false`. The variants below cover
//! programmer errors during registration, recognition outcomes the caller
//! must handle, and failures of the surrounding I/O and settings layers.

use crate::core::settings::SettingsError;
use crate::io::error::IoError;
use crate::recognition::RecognitionError;
use crate::viewtype::RegistryError;
use thiserror::Error;

/// Main error type for binview operations.
#[derive(Debug, Error)]
pub enum BinviewError {
    /// View type registration rejected
    #[error("Registration error: {0}")]
    Registry(#[from] RegistryError),

    /// No view type could be selected or constructed
    #[error("Recognition error: {0}")]
    Recognition(#[from] RecognitionError),

    /// Data source errors
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Load settings errors
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    /// Configuration could not be parsed
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),

    /// Caller-imposed time bound elapsed
    #[error("Operation timeout after {millis}ms")]
    Timeout { millis: u64 },

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for binview operations
pub type Result<T> = std::result::Result<T, BinviewError>;
