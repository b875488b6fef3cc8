//! Multi-backend image generation engine.
//!
//! Requests go to a credentialed primary backend first and fall back to a
//! keyless secondary (optionally through a local anonymizing proxy with
//! per-attempt identity rotation). Every response body is validated as a real
//! image before it is returned, failures are classified per attempt, and a
//! request only fails once every backend in the chain has spent its attempt
//! budget.

pub mod config;
pub mod core;
pub mod error;
pub mod orchestrator;
pub mod services;
pub mod traits;
pub mod types;

pub use config::{EngineConfig, RetryConfig};
pub use crate::core::{AttemptPolicy, CredentialPool, NextAction};
pub use error::{EngineError, EngineResult};
pub use orchestrator::{GenerateRoute, Orchestrator};
pub use traits::{IdentityRotator, ImageBackend, ImageEditBackend};
pub use types::{
    BackendFailure, Credential, GeneratedImage, GenerationMode, GenerationRequest,
};
