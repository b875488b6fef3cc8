//! Engine configuration with environment overrides.
//!
//! Every knob has a compiled-in default so the engine runs with nothing but
//! credentials in the environment. Callers construct [`EngineConfig`] directly
//! in tests and via [`EngineConfig::from_env`] in binaries.

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_HF_BASE: &str = "https://api-inference.huggingface.co";
const DEFAULT_IMAGE_MODEL: &str = "stabilityai/stable-diffusion-xl-base-1.0";
const DEFAULT_EDIT_MODEL: &str = "timbrooks/instruct-pix2pix";
const DEFAULT_POLLINATIONS_BASE: &str = "https://image.pollinations.ai";

/// Name prefix scanned for credentials in the environment
pub const DEFAULT_CREDENTIAL_PREFIX: &str = "HF_TOKEN";

/// Smallest body size accepted as a real image, in bytes
pub const DEFAULT_MIN_IMAGE_BYTES: usize = 4000;

/// Primary text-to-image backend settings
#[derive(Debug, Clone)]
pub struct HuggingFaceConfig {
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_HF_BASE.to_string(),
            model: DEFAULT_IMAGE_MODEL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Image-edit backend settings
#[derive(Debug, Clone)]
pub struct EditConfig {
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for EditConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_HF_BASE.to_string(),
            model: DEFAULT_EDIT_MODEL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Keyless fallback backend settings
#[derive(Debug, Clone)]
pub struct PollinationsConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Optional pixel dimensions appended to the prompt URL when set
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Route requests through the anonymizing proxy; when true and no proxy
    /// is detected at startup, this backend is disabled for the process.
    pub via_proxy: bool,
}

impl Default for PollinationsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_POLLINATIONS_BASE.to_string(),
            timeout: Duration::from_secs(60),
            width: None,
            height: None,
            via_proxy: true,
        }
    }
}

/// Attempt bounds and retry delays per route
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub primary_attempts: u32,
    pub fallback_attempts: u32,
    /// Pause before retrying a backend that reported it was still loading
    pub warmup_delay: Duration,
    /// Pause before retrying after a rate-limit response
    pub rate_limit_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            primary_attempts: 3,
            fallback_attempts: 5,
            warmup_delay: Duration::from_secs(5),
            rate_limit_delay: Duration::ZERO,
        }
    }
}

/// Local anonymizing proxy discovery settings
#[derive(Debug, Clone)]
pub struct TorConfig {
    /// SOCKS ports probed in order; the first one accepting a connection wins
    pub socks_ports: Vec<u16>,
    pub probe_timeout: Duration,
    /// Upper bound on one full control-channel rotation exchange
    pub control_timeout: Duration,
    /// Control-channel cookie locations tried before falling back to a
    /// null-password handshake
    pub cookie_paths: Vec<PathBuf>,
}

impl Default for TorConfig {
    fn default() -> Self {
        Self {
            socks_ports: vec![9050, 9150],
            probe_timeout: Duration::from_millis(500),
            control_timeout: Duration::from_secs(5),
            cookie_paths: vec![
                PathBuf::from("/run/tor/control.authcookie"),
                PathBuf::from("/var/run/tor/control.authcookie"),
                PathBuf::from("/var/lib/tor/control_auth_cookie"),
            ],
        }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub credential_prefix: String,
    pub primary: HuggingFaceConfig,
    pub edit: EditConfig,
    pub fallback: PollinationsConfig,
    pub retry: RetryConfig,
    pub min_image_bytes: usize,
    pub tor: TorConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            credential_prefix: DEFAULT_CREDENTIAL_PREFIX.to_string(),
            primary: HuggingFaceConfig::default(),
            edit: EditConfig::default(),
            fallback: PollinationsConfig::default(),
            retry: RetryConfig::default(),
            min_image_bytes: DEFAULT_MIN_IMAGE_BYTES,
            tor: TorConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `HF_API_BASE`, `HF_IMAGE_MODEL`, `HF_EDIT_MODEL`,
    /// `POLLINATIONS_API_BASE`, `POLLINATIONS_WIDTH` and `POLLINATIONS_HEIGHT`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(base) = non_empty_env("HF_API_BASE") {
            config.primary.base_url = base.clone();
            config.edit.base_url = base;
        }
        if let Some(model) = non_empty_env("HF_IMAGE_MODEL") {
            config.primary.model = model;
        }
        if let Some(model) = non_empty_env("HF_EDIT_MODEL") {
            config.edit.model = model;
        }
        if let Some(base) = non_empty_env("POLLINATIONS_API_BASE") {
            config.fallback.base_url = base;
        }
        config.fallback.width = parsed_env("POLLINATIONS_WIDTH");
        config.fallback.height = parsed_env("POLLINATIONS_HEIGHT");

        config
    }
}

/// Read an environment variable, treating blank values as unset
fn non_empty_env(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
        _ => None,
    }
}

fn parsed_env(name: &str) -> Option<u32> {
    non_empty_env(name).and_then(|value| value.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_bounds() {
        let config = EngineConfig::default();
        assert_eq!(config.retry.primary_attempts, 3);
        assert_eq!(config.retry.fallback_attempts, 5);
        assert_eq!(config.min_image_bytes, 4000);
        assert_eq!(config.tor.socks_ports, vec![9050, 9150]);
        assert_eq!(config.tor.control_timeout, Duration::from_secs(5));
        assert!(config.fallback.via_proxy);
        assert!(config.fallback.width.is_none());
    }

    #[test]
    fn test_env_overrides_applied() {
        std::env::set_var("HF_API_BASE", "http://localhost:8080");
        std::env::set_var("HF_IMAGE_MODEL", "acme/test-model");
        std::env::set_var("POLLINATIONS_WIDTH", "1024");

        let config = EngineConfig::from_env();
        assert_eq!(config.primary.base_url, "http://localhost:8080");
        assert_eq!(config.edit.base_url, "http://localhost:8080");
        assert_eq!(config.primary.model, "acme/test-model");
        assert_eq!(config.fallback.width, Some(1024));
        // untouched values keep their defaults
        assert_eq!(config.edit.model, DEFAULT_EDIT_MODEL);

        std::env::remove_var("HF_API_BASE");
        std::env::remove_var("HF_IMAGE_MODEL");
        std::env::remove_var("POLLINATIONS_WIDTH");
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        std::env::set_var("HF_EDIT_MODEL", "   ");
        let config = EngineConfig::from_env();
        assert_eq!(config.edit.model, DEFAULT_EDIT_MODEL);
        std::env::remove_var("HF_EDIT_MODEL");
    }
}
