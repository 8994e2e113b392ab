//! Outbound client for the Vercel REST API.
//!
//! Each tool performs exactly one GET through `VercelClient::get`. The
//! response body is passed back verbatim as JSON.

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::credential::Credential;
use crate::tools::ToolOutcome;

/// Errors reaching the upstream or reading its answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamCallError {
    /// Request could not be completed (DNS, connect, timeout, ...).
    Transport(String),
    /// The upstream answered 2xx with a body that is not JSON.
    Decode(String),
    /// Endpoint URL could not be built from the base URL.
    InvalidUrl(String),
}

impl fmt::Display for UpstreamCallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "Request to Vercel API failed: {}", msg),
            Self::Decode(msg) => write!(f, "Invalid JSON from Vercel API: {}", msg),
            Self::InvalidUrl(msg) => write!(f, "Invalid Vercel API URL: {}", msg),
        }
    }
}

impl std::error::Error for UpstreamCallError {}

/// HTTP client bound to one API base URL.
#[derive(Clone, Debug)]
pub struct VercelClient {
    http: reqwest::Client,
    base_url: Url,
}

impl VercelClient {
    /// Create a client for `base_url` with a request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid Vercel API base URL `{}`", base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Vercel API base URL `{}` cannot carry a path", base_url);
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { http, base_url })
    }

    /// Build an endpoint URL from path segments and query pairs.
    ///
    /// Segments are percent-encoded individually, so an id containing `/`
    /// stays one segment.
    pub fn endpoint<S: AsRef<str>>(
        &self,
        segments: &[S],
        query: &[(&str, String)],
    ) -> Result<Url, UpstreamCallError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| UpstreamCallError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }

    /// Perform one authenticated GET and classify the answer.
    pub async fn get(&self, url: Url, credential: &Credential) -> Result<ToolOutcome, UpstreamCallError> {
        debug!("GET {}", url);

        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, format!("Bearer {}", credential.expose()))
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| UpstreamCallError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| UpstreamCallError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Ok(ToolOutcome::Failure {
                message: format!("API request failed with status code {}", status.as_u16()),
                body: Some(body),
            });
        }

        if body.trim().is_empty() {
            return Ok(ToolOutcome::Success(Value::Null));
        }

        let data = serde_json::from_str(&body).map_err(|e| UpstreamCallError::Decode(e.to_string()))?;
        Ok(ToolOutcome::Success(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> VercelClient {
        VercelClient::new(base, Duration::from_secs(10)).unwrap()
    }

    #[test]
    fn test_endpoint_plain_path() {
        let url = client("https://api.vercel.com")
            .endpoint(&["v9", "projects"], &[])
            .unwrap();
        assert_eq!(url.as_str(), "https://api.vercel.com/v9/projects");
    }

    #[test]
    fn test_endpoint_keeps_base_prefix() {
        let url = client("http://127.0.0.1:9999/proxy/")
            .endpoint(&["v2", "user"], &[])
            .unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9999/proxy/v2/user");
    }

    #[test]
    fn test_endpoint_encodes_segments_and_query() {
        let url = client("https://api.vercel.com")
            .endpoint(
                &["v9", "projects", "team/prj 1"],
                &[("projectId", "a&b".to_string()), ("limit", "5".to_string())],
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.vercel.com/v9/projects/team%2Fprj%201?projectId=a%26b&limit=5"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(VercelClient::new("not a url", Duration::from_secs(1)).is_err());
        assert!(VercelClient::new("mailto:someone@example.com", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_error_display() {
        let err = UpstreamCallError::Transport("timed out".to_string());
        assert_eq!(err.to_string(), "Request to Vercel API failed: timed out");

        let err = UpstreamCallError::Decode("expected value".to_string());
        assert_eq!(err.to_string(), "Invalid JSON from Vercel API: expected value");
    }

    #[tokio::test]
    async fn test_transport_error_when_unreachable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = VercelClient::new(&format!("http://{}", addr), Duration::from_secs(2)).unwrap();
        let url = client.endpoint(&["v2", "user"], &[]).unwrap();
        let credential = Credential::new("abcd1234efgh").unwrap();

        let err = client.get(url, &credential).await.unwrap_err();
        assert!(matches!(err, UpstreamCallError::Transport(_)));
    }
}
