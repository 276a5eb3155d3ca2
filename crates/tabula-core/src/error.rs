//! Error types for the guardrail core.

use std::path::PathBuf;

use thiserror::Error;

/// Failures reading from the dataset collaborator.
#[derive(Error, Debug)]
pub enum DatasetError {
    /// The collaborator cannot currently answer (e.g. poisoned state).
    #[error("dataset provider unavailable: {0}")]
    Unavailable(String),

    #[error("dataset not found: {0}")]
    NotFound(String),

    #[error("failed to parse {file}: {reason}")]
    Parse { file: String, reason: String },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Internal failure inside `Brain::think` before the backend is called.
///
/// Never shown to the user; it is logged and replaced by a fixed apology.
#[derive(Error, Debug)]
pub enum BrainError {
    #[error("dataset context: {0}")]
    Dataset(#[from] DatasetError),
}

/// Failures loading the application configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
