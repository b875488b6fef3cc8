//! Retry and failover orchestration across image backends.
//!
//! Backends are tried strictly in route order. Within a route the orchestrator
//! loops attempts under the route's [`AttemptPolicy`], consulting
//! [`next_action`] after every classified failure; a route is only left once
//! its budget is spent. Credentials are drawn fresh from the pool per attempt
//! and identities are rotated per attempt on anonymized routes.

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::core::flow::{next_action, AttemptPolicy, NextAction};
use crate::core::pool::CredentialPool;
use crate::core::validator::{validate_image, DecodedImage};
use crate::error::{EngineError, EngineResult};
use crate::services::{
    build_client, HuggingFaceBackend, HuggingFaceEditBackend, PollinationsBackend, TorControl,
    TorProxy,
};
use crate::traits::{IdentityRotator, ImageBackend, ImageEditBackend};
use crate::types::{
    AuthRequirement, BackendFailure, GeneratedImage, GenerationMode, GenerationRequest,
};

/// One generation backend plus its retry policy and optional identity rotation
pub struct GenerateRoute {
    backend: Box<dyn ImageBackend>,
    policy: AttemptPolicy,
    rotator: Option<Box<dyn IdentityRotator>>,
}

impl GenerateRoute {
    pub fn direct(backend: Box<dyn ImageBackend>, policy: AttemptPolicy) -> Self {
        Self {
            backend,
            policy,
            rotator: None,
        }
    }

    /// Route whose outbound identity is rotated before every attempt
    pub fn anonymized(
        backend: Box<dyn ImageBackend>,
        policy: AttemptPolicy,
        rotator: Box<dyn IdentityRotator>,
    ) -> Self {
        Self {
            backend,
            policy,
            rotator: Some(rotator),
        }
    }
}

/// Drives requests through the backend chain until one yields a valid image
pub struct Orchestrator {
    credentials: CredentialPool,
    routes: Vec<GenerateRoute>,
    editor: Box<dyn ImageEditBackend>,
    edit_policy: AttemptPolicy,
    /// Backends kept out of the chain at startup, reported with every total
    /// failure so callers see why a fallback never ran
    disabled: Vec<(String, String)>,
}

impl Orchestrator {
    pub fn new(
        credentials: CredentialPool,
        routes: Vec<GenerateRoute>,
        editor: Box<dyn ImageEditBackend>,
    ) -> Self {
        Self {
            credentials,
            routes,
            editor,
            edit_policy: AttemptPolicy::new(1),
            disabled: Vec::new(),
        }
    }

    /// Editing defaults to a single attempt; a wider policy opts into the
    /// same retry planning the generation routes use.
    pub fn with_edit_policy(mut self, policy: AttemptPolicy) -> Self {
        self.edit_policy = policy;
        self
    }

    /// Record a backend that never entered the chain, with the reason
    pub fn with_disabled_route(
        mut self,
        backend: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        self.disabled.push((backend.into(), reason.into()));
        self
    }

    /// Wire the full chain from configuration: credential pool scanned from
    /// the environment, the credentialed primary first, the keyless fallback
    /// second. With `via_proxy` set the fallback only enters the chain when
    /// an anonymizing proxy is actually listening.
    pub async fn from_config(config: &EngineConfig) -> EngineResult<Self> {
        let credentials = CredentialPool::from_env(&config.credential_prefix);
        if credentials.is_empty() {
            warn!(
                prefix = %config.credential_prefix,
                "no credentials in the environment, credentialed backends will be skipped"
            );
        } else {
            info!(
                count = credentials.len(),
                names = ?credentials.names(),
                "credential pool loaded"
            );
        }

        let primary_policy = AttemptPolicy::new(config.retry.primary_attempts)
            .with_warmup_delay(config.retry.warmup_delay)
            .with_rate_limit_delay(config.retry.rate_limit_delay);
        let fallback_policy = AttemptPolicy::new(config.retry.fallback_attempts)
            .with_warmup_delay(config.retry.warmup_delay)
            .with_rate_limit_delay(config.retry.rate_limit_delay);

        let primary = HuggingFaceBackend::new(&config.primary)?;
        let mut routes = vec![GenerateRoute::direct(Box::new(primary), primary_policy)];
        let mut disabled = Vec::new();

        if config.fallback.via_proxy {
            match TorProxy::detect(&config.tor).await {
                Some(proxy) => {
                    info!(
                        socks_port = proxy.socks_port(),
                        "anonymizing proxy detected, fallback routed through it"
                    );
                    let client = proxy.proxied_client(config.fallback.timeout)?;
                    let backend =
                        PollinationsBackend::new(&config.fallback, config.min_image_bytes, client);
                    let rotator = TorControl::new(
                        proxy.control_port(),
                        config.tor.cookie_paths.clone(),
                        config.tor.control_timeout,
                    );
                    routes.push(GenerateRoute::anonymized(
                        Box::new(backend),
                        fallback_policy,
                        Box::new(rotator),
                    ));
                }
                None => {
                    warn!("no anonymizing proxy detected, fallback backend disabled for this process");
                    disabled.push((
                        PollinationsBackend::NAME.to_string(),
                        "anonymizing proxy not detected at startup".to_string(),
                    ));
                }
            }
        } else {
            let client = build_client(config.fallback.timeout)?;
            let backend = PollinationsBackend::new(&config.fallback, config.min_image_bytes, client);
            routes.push(GenerateRoute::direct(Box::new(backend), fallback_policy));
        }

        let editor = HuggingFaceEditBackend::new(&config.edit)?;

        let mut orchestrator = Self::new(credentials, routes, Box::new(editor));
        for (backend, reason) in disabled {
            orchestrator = orchestrator.with_disabled_route(backend, reason);
        }
        Ok(orchestrator)
    }

    /// Entry point: routes the request by its mode
    pub async fn dispatch(&self, request: &GenerationRequest) -> EngineResult<GeneratedImage> {
        let request_id = Uuid::new_v4();
        info!(request_id = %request_id, mode = %request.mode(), "dispatching request");
        match request.mode() {
            GenerationMode::Generate => self.generate(request, request_id).await,
            GenerationMode::Edit => self.edit(request, request_id).await,
        }
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
        request_id: Uuid,
    ) -> EngineResult<GeneratedImage> {
        let mut failures: Vec<(String, BackendFailure)> = Vec::new();

        for route in &self.routes {
            let backend_name = route.backend.descriptor().name;
            match self.run_route(route, request.prompt(), request_id).await {
                Ok(image) => return Ok(image),
                Err(failure) => {
                    warn!(
                        request_id = %request_id,
                        backend = backend_name,
                        error = %failure,
                        "backend exhausted, moving on"
                    );
                    failures.push((backend_name.to_string(), failure));
                }
            }
        }

        for (backend, reason) in &self.disabled {
            failures.push((backend.clone(), BackendFailure::Disabled(reason.clone())));
        }

        Err(EngineError::AllBackendsFailed { failures })
    }

    /// Drive one backend until it succeeds or its attempt budget is spent.
    /// Returns the last classified failure on exhaustion.
    async fn run_route(
        &self,
        route: &GenerateRoute,
        prompt: &str,
        request_id: Uuid,
    ) -> Result<GeneratedImage, BackendFailure> {
        let descriptor = route.backend.descriptor();

        // a credentialed backend with an empty pool fails without any traffic
        if descriptor.auth == AuthRequirement::Credential && self.credentials.is_empty() {
            return Err(BackendFailure::MissingCredentials);
        }

        let mut attempt = 0u32;
        loop {
            attempt += 1;

            if let Some(rotator) = &route.rotator {
                if let Err(err) = rotator.rotate_identity().await {
                    warn!(
                        request_id = %request_id,
                        backend = descriptor.name,
                        error = %err,
                        "identity rotation failed, continuing with current identity"
                    );
                }
            }

            let credential = match descriptor.auth {
                AuthRequirement::Credential => self.credentials.pick(),
                AuthRequirement::None => None,
            };
            debug!(
                request_id = %request_id,
                backend = descriptor.name,
                attempt,
                "attempt started"
            );

            let failure = match route.backend.generate(prompt, credential).await {
                Ok(bytes) => match validate_image(&bytes) {
                    Ok(decoded) => {
                        info!(
                            request_id = %request_id,
                            backend = descriptor.name,
                            attempt,
                            size = bytes.len(),
                            width = decoded.width,
                            height = decoded.height,
                            "image generated"
                        );
                        return Ok(assemble(bytes, decoded, descriptor.name));
                    }
                    Err(failure) => failure,
                },
                Err(failure) => failure,
            };

            match next_action(&failure, attempt, &route.policy) {
                NextAction::RetryNow => {
                    warn!(
                        request_id = %request_id,
                        backend = descriptor.name,
                        attempt,
                        error = %failure,
                        "attempt failed, retrying"
                    );
                }
                NextAction::RetryAfter(delay) => {
                    warn!(
                        request_id = %request_id,
                        backend = descriptor.name,
                        attempt,
                        error = %failure,
                        delay_ms = delay.as_millis() as u64,
                        "attempt failed, retrying after delay"
                    );
                    tokio::time::sleep(delay).await;
                }
                NextAction::GiveUp => return Err(failure),
            }
        }
    }

    async fn edit(
        &self,
        request: &GenerationRequest,
        request_id: Uuid,
    ) -> EngineResult<GeneratedImage> {
        let Some(source_image) = request.source_image() else {
            return Err(EngineError::InvalidRequest {
                message: "edit request without a source image".to_string(),
            });
        };
        // editing has no keyless fallback, so an empty pool fails up front
        if self.credentials.is_empty() {
            return Err(EngineError::ConfigError {
                message: "image editing requires an API credential and none are configured"
                    .to_string(),
            });
        }

        let descriptor = self.editor.descriptor();
        let mut attempt = 0u32;
        let failure = loop {
            attempt += 1;
            let Some(credential) = self.credentials.pick() else {
                break BackendFailure::MissingCredentials;
            };
            debug!(
                request_id = %request_id,
                backend = descriptor.name,
                credential = %credential,
                attempt,
                "edit attempt started"
            );

            let failure = match self
                .editor
                .edit(request.prompt(), source_image, credential)
                .await
            {
                Ok(bytes) => match validate_image(&bytes) {
                    Ok(decoded) => {
                        info!(
                            request_id = %request_id,
                            backend = descriptor.name,
                            attempt,
                            size = bytes.len(),
                            "image edited"
                        );
                        return Ok(assemble(bytes, decoded, descriptor.name));
                    }
                    Err(failure) => failure,
                },
                Err(failure) => failure,
            };

            match next_action(&failure, attempt, &self.edit_policy) {
                NextAction::RetryNow => {
                    warn!(
                        request_id = %request_id,
                        backend = descriptor.name,
                        attempt,
                        error = %failure,
                        "edit attempt failed, retrying"
                    );
                }
                NextAction::RetryAfter(delay) => {
                    warn!(
                        request_id = %request_id,
                        backend = descriptor.name,
                        attempt,
                        error = %failure,
                        delay_ms = delay.as_millis() as u64,
                        "edit attempt failed, retrying after delay"
                    );
                    tokio::time::sleep(delay).await;
                }
                NextAction::GiveUp => break failure,
            }
        };

        warn!(
            request_id = %request_id,
            backend = descriptor.name,
            error = %failure,
            "edit exhausted"
        );
        Err(EngineError::AllBackendsFailed {
            failures: vec![(descriptor.name.to_string(), failure)],
        })
    }
}

fn assemble(bytes: Vec<u8>, decoded: DecodedImage, backend: &str) -> GeneratedImage {
    GeneratedImage {
        bytes,
        mime_type: decoded.mime_type.to_string(),
        width: decoded.width,
        height: decoded.height,
        backend: backend.to_string(),
    }
}
