//! Backend service implementations.
//!
//! Each service performs single HTTP attempts and classifies outcomes into
//! [`BackendFailure`](crate::types::BackendFailure) values; looping, delays
//! and failover live in the orchestrator.

use std::time::Duration;

use crate::core::validator::body_excerpt;
use crate::error::{EngineError, EngineResult};
use crate::types::BackendFailure;

pub mod hugging_face;
pub mod pollinations;
pub mod tor;

#[cfg(test)]
mod tests;

pub use hugging_face::{HuggingFaceBackend, HuggingFaceEditBackend};
pub use pollinations::PollinationsBackend;
pub use tor::{TorControl, TorProxy};

/// Plain HTTP client with a per-request timeout
pub(crate) fn build_client(timeout: Duration) -> EngineResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| EngineError::ConfigError {
            message: format!("failed to build HTTP client: {err}"),
        })
}

/// Map an error HTTP status to its retry class.
///
/// 429 and 503 are transient states the providers document; anything else is
/// reported with the body excerpt since those tend to carry the real reason.
pub(crate) fn classify_error_status(status: u16, body: &[u8]) -> BackendFailure {
    match status {
        429 => BackendFailure::RateLimited,
        503 => BackendFailure::WarmingUp,
        _ => BackendFailure::Upstream {
            status,
            message: body_excerpt(body),
        },
    }
}

/// Connection, DNS, TLS and timeout errors all land here; they are
/// indistinguishable for retry purposes.
pub(crate) fn network_failure(err: reqwest::Error) -> BackendFailure {
    BackendFailure::Network(err.to_string())
}
