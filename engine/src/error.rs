//! Engine error types

use thiserror::Error;

use crate::types::BackendFailure;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine error types
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("configuration error: {message}")]
    ConfigError { message: String },

    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("transport error: {message}")]
    TransportError { message: String },

    /// Every backend in the chain was exhausted; carries the last classified
    /// failure per backend for the combined diagnostic.
    #[error("image generation failed: {}", render_failures(.failures))]
    AllBackendsFailed {
        failures: Vec<(String, BackendFailure)>,
    },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

fn render_failures(failures: &[(String, BackendFailure)]) -> String {
    if failures.is_empty() {
        return "no backends were attempted".to_string();
    }
    failures
        .iter()
        .map(|(backend, failure)| format!("{backend}: {failure}"))
        .collect::<Vec<_>>()
        .join("; ")
}
