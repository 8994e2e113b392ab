use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use crate::credential::Credential;

pub const SERVER_NAME: &str = "MCP Vercel Bridge";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const SERVER_DESCRIPTION: &str =
    "A server that exposes Vercel REST API operations as named tools over HTTP";

/// Environment variable holding the initial bearer token.
pub const TOKEN_ENV: &str = "VERCEL_TOKEN";
/// Environment variable overriding the upstream API base URL.
pub const API_URL_ENV: &str = "VERCEL_API_URL";

pub const DEFAULT_BIND: &str = "0.0.0.0:8002";
pub const DEFAULT_API_BASE_URL: &str = "https://api.vercel.com";
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

/// Runtime settings for the bridge server.
#[derive(Clone)]
pub struct BridgeConfig {
    pub bind: SocketAddr,
    pub api_base_url: String,
    /// Initial credential; may be replaced at runtime via `set_credential`.
    pub token: Option<Credential>,
    /// Bound on each outbound upstream call.
    pub upstream_timeout: Duration,
    /// Bound on handling one inbound request, body included.
    pub request_timeout: Duration,
    pub max_body_bytes: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8002)),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            token: None,
            upstream_timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl BridgeConfig {
    /// Replace the initial credential; blank tokens leave it unset.
    pub fn with_token(mut self, token: Option<&str>) -> Self {
        self.token = token.and_then(|t| Credential::new(t.trim()));
        self
    }
}

impl fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("bind", &self.bind)
            .field("api_base_url", &self.api_base_url)
            .field("token", &self.token)
            .field("upstream_timeout", &self.upstream_timeout)
            .field("request_timeout", &self.request_timeout)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}
