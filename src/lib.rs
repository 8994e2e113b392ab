// Core modules
pub mod config;
pub mod credential;
pub mod envelope;
pub mod types;
pub mod upstream;

// Tools and transport
pub mod api;
pub mod client;
pub mod server;
pub mod tools;

// Re-export key types and functions
pub use client::{BridgeClient, CallOutcome, ToolSummary};
pub use config::BridgeConfig;
pub use credential::{Credential, CredentialStore};
pub use envelope::{ErrorKind, ResponseEnvelope};
pub use server::{serve, serve_with_listener};
pub use tools::{ToolHandler, ToolRegistry};

use std::sync::Arc;

use anyhow::Result;
use tools::{ServerStatusHandler, SetCredentialHandler, VercelCatalogue};
use upstream::VercelClient;

/// Build the registry with every tool the bridge exposes.
///
/// Registration order is the order `GET /tools` reports.
pub fn create_registry(config: &BridgeConfig) -> Result<ToolRegistry> {
    let client = Arc::new(VercelClient::new(
        &config.api_base_url,
        config.upstream_timeout,
    )?);
    let catalogue = VercelCatalogue::new(client);

    let registry = ToolRegistry::new(CredentialStore::new(config.token.clone()))
        .register_handler(catalogue.list_projects)?
        .register_handler(catalogue.list_deployments)?
        .register_handler(catalogue.get_project_info)?
        .register_handler(ServerStatusHandler::new())?
        .register_handler(SetCredentialHandler::new())?
        .register_handler(catalogue.list_project_domains)?
        .register_handler(catalogue.list_environment_variables)?
        .register_handler(catalogue.get_user_info)?
        .register_handler(catalogue.list_deployment_aliases)?;

    Ok(registry)
}
