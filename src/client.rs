//! Client for a running bridge.
//!
//! A pure consumer of the HTTP surface: discovery, invocation and the root
//! descriptor. Both HTTP-level and envelope-level failures count as a failed
//! call.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::tools::JsonObject;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8002";
/// Environment variable overriding the bridge URL the CLI talks to.
pub const SERVER_URL_ENV: &str = "VERCEL_BRIDGE_URL";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const PING_TIMEOUT: Duration = Duration::from_secs(2);

/// Entry of `GET /tools`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSummary {
    pub name: String,
    pub description: String,
}

/// Result of `POST /tools/{name}`.
#[derive(Debug, Clone)]
pub struct CallOutcome {
    pub http_status: u16,
    /// Response body; non-JSON bodies are kept as a JSON string.
    pub body: Value,
}

impl CallOutcome {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.http_status)
            && self.body.get("status").and_then(Value::as_str) == Some("success")
    }

    pub fn data(&self) -> Option<&Value> {
        self.body.get("data")
    }

    /// Human-readable failure message, if the server supplied one.
    pub fn message(&self) -> Option<&str> {
        match &self.body {
            Value::String(text) => Some(text.as_str()),
            body => body
                .get("message")
                .or_else(|| body.get("error"))
                .and_then(Value::as_str),
        }
    }
}

#[derive(Clone, Debug)]
pub struct BridgeClient {
    http: reqwest::Client,
    base_url: Url,
}

impl BridgeClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid bridge URL `{}`", base_url))?;
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Bridge URL `{}` cannot carry a path", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `GET /`.
    pub async fn server_info(&self) -> Result<Value> {
        let response = self
            .http
            .get(self.url(&[])?)
            .send()
            .await
            .context("Failed to reach bridge server")?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    /// Whether the discovery endpoint answers within a short timeout.
    pub async fn ping(&self) -> bool {
        let Ok(url) = self.url(&["tools"]) else {
            return false;
        };
        matches!(
            self.http.get(url).timeout(PING_TIMEOUT).send().await,
            Ok(response) if response.status().is_success()
        )
    }

    /// `GET /tools`.
    pub async fn list_tools(&self) -> Result<Vec<ToolSummary>> {
        let response = self
            .http
            .get(self.url(&["tools"])?)
            .send()
            .await
            .context("Failed to reach bridge server")?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    /// `POST /tools/{name}` with `params` as the JSON body.
    pub async fn call_tool(&self, name: &str, params: &JsonObject) -> Result<CallOutcome> {
        let response = self
            .http
            .post(self.url(&["tools", name])?)
            .json(params)
            .send()
            .await
            .with_context(|| format!("Failed to call tool `{}`", name))?;

        let http_status = response.status().as_u16();
        let text = response.text().await?;
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));

        Ok(CallOutcome { http_status, body })
    }
}
