//! Handler for the `set_credential` tool.
//!
//! Replaces the bearer token used for upstream calls for the rest of the
//! process lifetime.

use serde_json::json;
use tracing::info;

use crate::credential::mask_token;
use crate::tools::params::{ParamSpec, ToolArgs};
use crate::tools::registry::{ToolContext, ToolFuture, ToolHandler, ToolOutcome};

/// Handler for the `set_credential` tool.
pub struct SetCredentialHandler {
    params: Vec<ParamSpec>,
}

impl SetCredentialHandler {
    pub fn new() -> Self {
        Self {
            params: vec![ParamSpec::required("token", "Your Vercel API token")],
        }
    }
}

impl Default for SetCredentialHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolHandler for SetCredentialHandler {
    fn name(&self) -> &str {
        "set_credential"
    }

    fn description(&self) -> &str {
        "Set the Vercel API token for this server session"
    }

    fn parameters(&self) -> &[ParamSpec] {
        &self.params
    }

    fn requires_credential(&self) -> bool {
        false
    }

    fn execute(&self, args: ToolArgs, ctx: ToolContext) -> ToolFuture<'_> {
        Box::pin(async move {
            let token = args.text("token").unwrap_or_default();
            let masked = mask_token(&token);

            ctx.credentials.set(&token).await;
            info!("Vercel token updated: {}", masked);

            Ok(ToolOutcome::Success(json!({
                "message": "Vercel token updated successfully",
                "masked_token": masked,
            })))
        })
    }
}
