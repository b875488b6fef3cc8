//! Keyless fallback backend speaking the URL-prompt protocol.
//!
//! The prompt is percent-encoded into the request path and the provider
//! answers with raw image bytes. No authentication exists, so this backend is
//! usually routed through the anonymizing proxy by injecting a proxied client.

use async_trait::async_trait;
use tracing::debug;

use crate::config::PollinationsConfig;
use crate::core::validator::ensure_minimum_size;
use crate::services::{classify_error_status, network_failure};
use crate::traits::ImageBackend;
use crate::types::{AuthRequirement, BackendDescriptor, BackendFailure, Credential};

pub struct PollinationsBackend {
    base_url: String,
    width: Option<u32>,
    height: Option<u32>,
    min_image_bytes: usize,
    client: reqwest::Client,
}

impl PollinationsBackend {
    pub const NAME: &'static str = "pollinations";

    /// The client is injected so the caller decides whether requests leave
    /// directly or through the proxy.
    pub fn new(config: &PollinationsConfig, min_image_bytes: usize, client: reqwest::Client) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            width: config.width,
            height: config.height,
            min_image_bytes,
            client,
        }
    }

    pub(crate) fn prompt_url(&self, prompt: &str) -> String {
        let mut url = format!("{}/prompt/{}", self.base_url, urlencoding::encode(prompt));
        let mut params = Vec::new();
        if let Some(width) = self.width {
            params.push(format!("width={width}"));
        }
        if let Some(height) = self.height {
            params.push(format!("height={height}"));
        }
        if !params.is_empty() {
            url.push('?');
            url.push_str(&params.join("&"));
        }
        url
    }

    /// This provider reports some failures as HTTP 200 with a tiny stub
    /// image, so 200 bodies below the threshold still count as failed.
    pub(crate) fn accept_body(&self, bytes: Vec<u8>) -> Result<Vec<u8>, BackendFailure> {
        ensure_minimum_size(&bytes, self.min_image_bytes)?;
        Ok(bytes)
    }
}

#[async_trait]
impl ImageBackend for PollinationsBackend {
    fn descriptor(&self) -> BackendDescriptor {
        BackendDescriptor {
            name: Self::NAME,
            endpoint: self.base_url.clone(),
            auth: AuthRequirement::None,
        }
    }

    async fn generate(
        &self,
        prompt: &str,
        _credential: Option<Credential>,
    ) -> Result<Vec<u8>, BackendFailure> {
        let url = self.prompt_url(prompt);
        debug!(backend = Self::NAME, "sending generation request");

        let response = self.client.get(&url).send().await.map_err(network_failure)?;
        let status = response.status();
        let body = response.bytes().await.map_err(network_failure)?;
        if status.is_success() {
            self.accept_body(body.to_vec())
        } else {
            Err(classify_error_status(status.as_u16(), &body))
        }
    }
}
