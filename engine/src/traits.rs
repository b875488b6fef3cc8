//! Trait definitions with mockall annotations for testing

use async_trait::async_trait;

use crate::error::EngineResult;
use crate::types::{BackendDescriptor, BackendFailure, Credential};

/// A text-to-image backend.
///
/// Implementations perform exactly one upstream attempt per call and classify
/// the outcome; retry and failover decisions belong to the orchestrator.
#[mockall::automock]
#[async_trait]
pub trait ImageBackend: Send + Sync {
    /// Static description used for routing, logging and failure reports
    fn descriptor(&self) -> BackendDescriptor;

    /// Run a single generation attempt and return the raw response body.
    ///
    /// `credential` is `Some` when the descriptor declares
    /// [`AuthRequirement::Credential`](crate::types::AuthRequirement); keyless
    /// backends receive `None`.
    async fn generate(
        &self,
        prompt: &str,
        credential: Option<Credential>,
    ) -> Result<Vec<u8>, BackendFailure>;
}

/// An image-edit backend, always credentialed
#[mockall::automock]
#[async_trait]
pub trait ImageEditBackend: Send + Sync {
    fn descriptor(&self) -> BackendDescriptor;

    /// Apply `prompt` to `source_image` in a single upstream attempt
    async fn edit(
        &self,
        prompt: &str,
        source_image: &[u8],
        credential: Credential,
    ) -> Result<Vec<u8>, BackendFailure>;
}

/// Rotates the outbound identity of an anonymizing transport between attempts
#[mockall::automock]
#[async_trait]
pub trait IdentityRotator: Send + Sync {
    async fn rotate_identity(&self) -> EngineResult<()>;
}
