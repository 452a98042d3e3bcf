//! Error types for the load test CLI
//!
//! These cover everything outside a single iteration: configuration, the
//! HTTP client setup and writing reports. Failures inside an iteration are
//! modelled by [`crate::scenario::IterationError`] instead.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the load test CLI
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    #[error("Invalid configuration file '{path}': {message}")]
    ConfigParse { path: String, message: String },

    #[error("Invalid option '{name}': {reason}")]
    InvalidOption { name: String, reason: String },

    // === HTTP Client Errors ===
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    // === Report Errors ===
    #[error("Failed to write report '{path}': {error}")]
    ReportWrite { path: String, error: String },

    #[error("Failed to render report: {0}")]
    Template(#[from] minijinja::Error),

    // === IO Errors ===
    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an invalid option error
    pub fn invalid_option(name: &str, reason: &str) -> Self {
        Self::InvalidOption {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a config parse error for a file
    pub fn config_parse(path: &std::path::Path, message: impl ToString) -> Self {
        Self::ConfigParse {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }

    /// Create a report write error
    pub fn report_write(path: &std::path::Path, error: &io::Error) -> Self {
        Self::ReportWrite {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }
}
