//! Shared types for requests, credentials, backends and their failures

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Whether an image was requested from scratch or derived from a source image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationMode {
    Generate,
    Edit,
}

impl GenerationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationMode::Generate => "generate",
            GenerationMode::Edit => "edit",
        }
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A validated request handed to the orchestrator.
///
/// Construction goes through [`GenerationRequest::generate`] or
/// [`GenerationRequest::edit`], which reject blank prompts and empty source
/// images so that no backend traffic is ever spent on them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    prompt: String,
    source_image: Option<Vec<u8>>,
}

impl GenerationRequest {
    /// Text-to-image request. Fails on a blank prompt.
    pub fn generate(prompt: impl Into<String>) -> EngineResult<Self> {
        let prompt = normalized_prompt(prompt)?;
        Ok(Self {
            prompt,
            source_image: None,
        })
    }

    /// Image-edit request. Fails on a blank prompt or an empty source image.
    pub fn edit(prompt: impl Into<String>, source_image: Vec<u8>) -> EngineResult<Self> {
        let prompt = normalized_prompt(prompt)?;
        if source_image.is_empty() {
            return Err(EngineError::InvalidRequest {
                message: "source image must not be empty".to_string(),
            });
        }
        Ok(Self {
            prompt,
            source_image: Some(source_image),
        })
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn source_image(&self) -> Option<&[u8]> {
        self.source_image.as_deref()
    }

    pub fn mode(&self) -> GenerationMode {
        if self.source_image.is_some() {
            GenerationMode::Edit
        } else {
            GenerationMode::Generate
        }
    }
}

fn normalized_prompt(prompt: impl Into<String>) -> EngineResult<String> {
    let prompt = prompt.into();
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidRequest {
            message: "prompt must not be empty".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

/// A named API credential drawn from the pool.
///
/// The token never appears in `Debug` or `Display` output; logs identify a
/// credential by its environment variable name only.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    name: String,
    token: String,
}

impl Credential {
    pub fn new(name: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            token: token.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential({})", self.name)
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Whether a backend needs a credential from the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRequirement {
    None,
    Credential,
}

/// Static description of a backend, used for routing and diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendDescriptor {
    pub name: &'static str,
    pub endpoint: String,
    pub auth: AuthRequirement,
}

/// Classified failure of a single backend attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendFailure {
    /// Provider signalled rate limiting (HTTP 429)
    RateLimited,
    /// Provider is still loading the model (HTTP 503)
    WarmingUp,
    /// Body was too small to be a real image
    Placeholder { size: usize },
    /// Connection, DNS or timeout failure before a response arrived
    Network(String),
    /// Provider answered with a non-retryable error status
    Upstream { status: u16, message: String },
    /// Body arrived but did not decode as an image
    NotAnImage(String),
    /// Backend needs a credential and the pool is empty
    MissingCredentials,
    /// Backend was disabled at startup, with the reason
    Disabled(String),
}

impl fmt::Display for BackendFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendFailure::RateLimited => write!(f, "rate limited by the provider"),
            BackendFailure::WarmingUp => write!(f, "model is still loading"),
            BackendFailure::Placeholder { size } => {
                write!(f, "placeholder response ({size} bytes, below the image threshold)")
            }
            BackendFailure::Network(message) => write!(f, "network error: {message}"),
            BackendFailure::Upstream { status, message } => {
                write!(f, "upstream error (status {status}): {message}")
            }
            BackendFailure::NotAnImage(excerpt) => {
                write!(f, "response is not an image: {excerpt}")
            }
            BackendFailure::MissingCredentials => write!(f, "no API credentials configured"),
            BackendFailure::Disabled(reason) => write!(f, "backend disabled: {reason}"),
        }
    }
}

/// A successfully generated image plus the metadata callers report on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
    /// Name of the backend that produced the image
    pub backend: String,
}
