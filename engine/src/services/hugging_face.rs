//! Hugging Face inference backends: credentialed text-to-image and image edit

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tracing::debug;

use crate::config::{EditConfig, HuggingFaceConfig};
use crate::error::EngineResult;
use crate::services::{build_client, classify_error_status, network_failure};
use crate::traits::{ImageBackend, ImageEditBackend};
use crate::types::{AuthRequirement, BackendDescriptor, BackendFailure, Credential};

pub(crate) fn model_endpoint(base_url: &str, model: &str) -> String {
    format!("{}/models/{}", base_url.trim_end_matches('/'), model)
}

/// Primary text-to-image backend
pub struct HuggingFaceBackend {
    endpoint: String,
    client: reqwest::Client,
}

impl HuggingFaceBackend {
    pub const NAME: &'static str = "huggingface";

    pub fn new(config: &HuggingFaceConfig) -> EngineResult<Self> {
        Ok(Self {
            endpoint: model_endpoint(&config.base_url, &config.model),
            client: build_client(config.timeout)?,
        })
    }
}

#[async_trait]
impl ImageBackend for HuggingFaceBackend {
    fn descriptor(&self) -> BackendDescriptor {
        BackendDescriptor {
            name: Self::NAME,
            endpoint: self.endpoint.clone(),
            auth: AuthRequirement::Credential,
        }
    }

    async fn generate(
        &self,
        prompt: &str,
        credential: Option<Credential>,
    ) -> Result<Vec<u8>, BackendFailure> {
        let credential = credential.ok_or(BackendFailure::MissingCredentials)?;
        debug!(backend = Self::NAME, credential = %credential, "sending generation request");

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", credential.token()))
            .json(&serde_json::json!({ "inputs": prompt }))
            .send()
            .await
            .map_err(network_failure)?;

        let status = response.status();
        let body = response.bytes().await.map_err(network_failure)?;
        if status.is_success() {
            Ok(body.to_vec())
        } else {
            Err(classify_error_status(status.as_u16(), &body))
        }
    }
}

/// Instruction-based image edit backend.
///
/// The source image travels base64-encoded in `inputs` with the instruction
/// under `parameters.prompt`, the layout instruct-pix2pix style models accept.
pub struct HuggingFaceEditBackend {
    endpoint: String,
    client: reqwest::Client,
}

impl HuggingFaceEditBackend {
    pub const NAME: &'static str = "huggingface-edit";

    pub fn new(config: &EditConfig) -> EngineResult<Self> {
        Ok(Self {
            endpoint: model_endpoint(&config.base_url, &config.model),
            client: build_client(config.timeout)?,
        })
    }
}

pub(crate) fn edit_payload(prompt: &str, source_image: &[u8]) -> serde_json::Value {
    serde_json::json!({
        "inputs": BASE64.encode(source_image),
        "parameters": { "prompt": prompt }
    })
}

#[async_trait]
impl ImageEditBackend for HuggingFaceEditBackend {
    fn descriptor(&self) -> BackendDescriptor {
        BackendDescriptor {
            name: Self::NAME,
            endpoint: self.endpoint.clone(),
            auth: AuthRequirement::Credential,
        }
    }

    async fn edit(
        &self,
        prompt: &str,
        source_image: &[u8],
        credential: Credential,
    ) -> Result<Vec<u8>, BackendFailure> {
        debug!(backend = Self::NAME, credential = %credential, "sending edit request");

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", credential.token()))
            .json(&edit_payload(prompt, source_image))
            .send()
            .await
            .map_err(network_failure)?;

        let status = response.status();
        let body = response.bytes().await.map_err(network_failure)?;
        if status.is_success() {
            Ok(body.to_vec())
        } else {
            Err(classify_error_status(status.as_u16(), &body))
        }
    }
}
