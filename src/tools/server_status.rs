//! Handler for the `check_server_status` tool.
//!
//! Reports bridge health without touching the upstream API.

use std::time::Duration;

use serde_json::json;
use tokio::process::Command;
use tracing::debug;

use crate::config::{SERVER_NAME, SERVER_VERSION};
use crate::tools::params::ToolArgs;
use crate::tools::registry::{ToolContext, ToolFuture, ToolHandler, ToolOutcome};

const CLI_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const NOT_INSTALLED: &str = "Not installed";

/// Handler for the `check_server_status` tool.
pub struct ServerStatusHandler {
    cli_program: String,
}

impl ServerStatusHandler {
    pub fn new() -> Self {
        Self::with_cli_program("vercel")
    }

    /// Probe a different CLI binary for the version report.
    pub fn with_cli_program(program: impl Into<String>) -> Self {
        Self {
            cli_program: program.into(),
        }
    }

    /// `Some(version)` when the CLI runs and exits successfully.
    async fn probe_cli(&self) -> Option<String> {
        let output = Command::new(&self.cli_program)
            .arg("--version")
            .kill_on_drop(true)
            .output();

        match tokio::time::timeout(CLI_PROBE_TIMEOUT, output).await {
            Ok(Ok(out)) if out.status.success() => {
                Some(String::from_utf8_lossy(&out.stdout).trim().to_string())
            }
            Ok(Ok(out)) => {
                debug!("`{} --version` exited with {}", self.cli_program, out.status);
                None
            }
            Ok(Err(e)) => {
                debug!("`{} --version` could not run: {}", self.cli_program, e);
                None
            }
            Err(_) => {
                debug!("`{} --version` timed out", self.cli_program);
                None
            }
        }
    }
}

impl Default for ServerStatusHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolHandler for ServerStatusHandler {
    fn name(&self) -> &str {
        "check_server_status"
    }

    fn description(&self) -> &str {
        "Check the status of the Vercel bridge server"
    }

    fn requires_credential(&self) -> bool {
        false
    }

    fn execute(&self, _args: ToolArgs, ctx: ToolContext) -> ToolFuture<'_> {
        Box::pin(async move {
            let cli_version = self.probe_cli().await;

            Ok(ToolOutcome::Success(json!({
                "status": "online",
                "server_name": SERVER_NAME,
                "version": SERVER_VERSION,
                "vercel_cli_installed": cli_version.is_some(),
                "vercel_cli_version": cli_version.as_deref().unwrap_or(NOT_INSTALLED),
                "vercel_token_configured": ctx.credential.is_some(),
                "pid": std::process::id(),
            })))
        })
    }
}
