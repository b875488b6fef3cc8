//! Local anonymizing proxy: detection, proxied clients and identity rotation

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tracing::debug;

use crate::config::TorConfig;
use crate::error::{EngineError, EngineResult};
use crate::traits::IdentityRotator;

/// A SOCKS proxy discovered on localhost
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TorProxy {
    socks_port: u16,
}

impl TorProxy {
    /// Probe the configured SOCKS ports in order; the first port accepting a
    /// TCP connection wins. Returns `None` when no proxy is listening.
    pub async fn detect(config: &TorConfig) -> Option<Self> {
        for &port in &config.socks_ports {
            if probe_port(port, config.probe_timeout).await {
                debug!(port, "SOCKS proxy detected");
                return Some(Self { socks_port: port });
            }
        }
        None
    }

    pub fn socks_port(&self) -> u16 {
        self.socks_port
    }

    /// Control channel convention: one port above the SOCKS port
    pub fn control_port(&self) -> u16 {
        self.socks_port.saturating_add(1)
    }

    /// HTTP client routing all traffic through the proxy.
    ///
    /// The socks5h scheme makes the proxy resolve hostnames, so DNS lookups
    /// never leave through the local resolver.
    pub fn proxied_client(&self, timeout: Duration) -> EngineResult<reqwest::Client> {
        let proxy = reqwest::Proxy::all(format!("socks5h://127.0.0.1:{}", self.socks_port))
            .map_err(|err| EngineError::ConfigError {
                message: format!("invalid proxy address: {err}"),
            })?;
        reqwest::Client::builder()
            .proxy(proxy)
            .timeout(timeout)
            .build()
            .map_err(|err| EngineError::ConfigError {
                message: format!("failed to build proxied HTTP client: {err}"),
            })
    }
}

pub(crate) async fn probe_port(port: u16, timeout: Duration) -> bool {
    matches!(
        tokio::time::timeout(timeout, TcpStream::connect(("127.0.0.1", port))).await,
        Ok(Ok(_))
    )
}

/// Identity rotation over the proxy's control channel.
///
/// Each rotation opens a fresh connection, authenticates, requests a new
/// circuit and disconnects; no connection is held between rotations. The whole
/// exchange runs under `control_timeout`, since detection only proves a port
/// accepts TCP connections, not that anything answers on it.
pub struct TorControl {
    control_port: u16,
    cookie_paths: Vec<PathBuf>,
    control_timeout: Duration,
}

impl TorControl {
    pub fn new(control_port: u16, cookie_paths: Vec<PathBuf>, control_timeout: Duration) -> Self {
        Self {
            control_port,
            cookie_paths,
            control_timeout,
        }
    }

    async fn rotation_exchange(&self) -> EngineResult<()> {
        let stream = TcpStream::connect(("127.0.0.1", self.control_port)).await?;
        let (read_half, mut write_half) = stream.into_split();
        let mut lines = BufReader::new(read_half).lines();

        let auth = cookie_auth_command(&self.cookie_paths).await;
        write_half.write_all(auth.as_bytes()).await?;
        write_half.write_all(b"\r\n").await?;
        expect_ok(&mut lines).await?;

        write_half.write_all(b"SIGNAL NEWNYM\r\n").await?;
        expect_ok(&mut lines).await?;

        // QUIT is best effort, the circuit switch already happened
        let _ = write_half.write_all(b"QUIT\r\n").await;
        debug!(port = self.control_port, "identity rotated");
        Ok(())
    }
}

/// Cookie authentication when a control cookie is readable, null-password
/// authentication otherwise
pub(crate) async fn cookie_auth_command(paths: &[PathBuf]) -> String {
    for path in paths {
        if let Ok(cookie) = tokio::fs::read(path).await {
            debug!(path = %path.display(), "using control auth cookie");
            return format!("AUTHENTICATE {}", hex::encode(cookie));
        }
    }
    "AUTHENTICATE \"\"".to_string()
}

async fn expect_ok(lines: &mut Lines<BufReader<OwnedReadHalf>>) -> EngineResult<()> {
    match lines.next_line().await? {
        Some(line) if line.starts_with("250") => Ok(()),
        Some(line) => Err(EngineError::TransportError {
            message: format!("control channel refused: {line}"),
        }),
        None => Err(EngineError::TransportError {
            message: "control channel closed early".to_string(),
        }),
    }
}

#[async_trait]
impl IdentityRotator for TorControl {
    async fn rotate_identity(&self) -> EngineResult<()> {
        tokio::time::timeout(self.control_timeout, self.rotation_exchange())
            .await
            .map_err(|_| EngineError::TransportError {
                message: format!(
                    "control channel rotation timed out after {}ms",
                    self.control_timeout.as_millis()
                ),
            })?
    }
}
