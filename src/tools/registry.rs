//! Tool registry and dispatcher.
//!
//! Provides a `ToolHandler` trait for implementing tools and a `ToolRegistry`
//! for registering them at startup and invoking them by name.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::credential::{Credential, CredentialStore};
use crate::envelope::{ErrorKind, ResponseEnvelope};
use crate::tools::params::{BindError, JsonObject, ParamSpec, ToolArgs};
use crate::types::ToolName;
use crate::upstream::UpstreamCallError;

/// Message returned when a tool needs a credential and none is configured.
pub const CREDENTIAL_MISSING_MESSAGE: &str =
    "credential not configured: set the VERCEL_TOKEN environment variable or call set_credential";

/// Future returned by `ToolHandler::execute`.
pub type ToolFuture<'a> = Pin<Box<dyn Future<Output = Result<ToolOutcome>> + Send + 'a>>;

/// Context passed to tool handlers during execution.
#[derive(Clone, Debug)]
pub struct ToolContext {
    /// Shared credential cell, for tools that manage the credential itself.
    pub credentials: CredentialStore,
    /// Credential snapshot taken when the call was dispatched.
    pub credential: Option<Credential>,
}

/// What a handler produced, before it is stamped into an envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    Success(Value),
    /// The upstream answered, but with a failure status.
    Failure {
        message: String,
        body: Option<String>,
    },
}

/// Public description of a registered tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: ToolName,
    pub description: String,
    pub requires_credential: bool,
    pub parameters: Vec<ParamSpec>,
}

/// Trait for handling tool invocations.
///
/// Each tool implements this trait to declare its parameters and execution logic.
pub trait ToolHandler: Send + Sync {
    /// Returns the tool's name (e.g., "list_projects").
    fn name(&self) -> &str;

    /// Returns the tool's description.
    fn description(&self) -> &str;

    /// Declared parameters, in the order they are documented.
    fn parameters(&self) -> &[ParamSpec] {
        &[]
    }

    /// Whether the dispatcher must refuse the call when no credential is set.
    fn requires_credential(&self) -> bool {
        true
    }

    /// Executes the tool with bound arguments.
    fn execute(&self, args: ToolArgs, ctx: ToolContext) -> ToolFuture<'_>;

    /// Converts this handler to a `ToolDescriptor` for discovery.
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: ToolName::new(self.name()),
            description: self.description().to_string(),
            requires_credential: self.requires_credential(),
            parameters: self.parameters().to_vec(),
        }
    }
}

/// Registration failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    DuplicateName(ToolName),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateName(name) => write!(f, "Tool already registered: {}", name),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Registry for managing tool handlers.
///
/// Built once at startup and read-only afterwards; the credential store is
/// the only state that changes while serving.
#[derive(Clone)]
pub struct ToolRegistry {
    handlers: Vec<Arc<dyn ToolHandler>>,
    index: HashMap<ToolName, usize>,
    credentials: CredentialStore,
}

impl ToolRegistry {
    /// Create a new empty tool registry around a credential store.
    pub fn new(credentials: CredentialStore) -> Self {
        Self {
            handlers: Vec::new(),
            index: HashMap::new(),
            credentials,
        }
    }

    /// Register a tool handler.
    pub fn register(mut self, handler: Arc<dyn ToolHandler>) -> Result<Self, RegistryError> {
        let name = ToolName::new(handler.name());
        if self.index.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }
        self.index.insert(name, self.handlers.len());
        self.handlers.push(handler);
        Ok(self)
    }

    /// Register a tool handler from a type that implements `ToolHandler`.
    pub fn register_handler<T: ToolHandler + 'static>(self, handler: T) -> Result<Self, RegistryError> {
        self.register(Arc::new(handler))
    }

    /// Get a tool handler by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.index.get(name).map(|&i| self.handlers[i].clone())
    }

    /// Check if a tool with the given name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Descriptors of all registered tools, in registration order.
    pub fn list(&self) -> Vec<ToolDescriptor> {
        self.handlers.iter().map(|h| h.descriptor()).collect()
    }

    /// List all registered tool names, in registration order.
    pub fn list_names(&self) -> Vec<String> {
        self.handlers.iter().map(|h| h.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Resolve `name`, bind `params` and run the tool.
    ///
    /// Never fails: every outcome, including handler errors, comes back as
    /// an envelope.
    pub async fn invoke(&self, name: &str, params: JsonObject) -> ResponseEnvelope {
        let Some(handler) = self.get(name) else {
            warn!(tool = name, "Tool not found");
            return ResponseEnvelope::internal(
                ErrorKind::NotFound,
                format!("Tool '{}' not found", name),
            );
        };

        let args = match ToolArgs::bind(handler.parameters(), params) {
            Ok(args) => args,
            Err(e) => {
                warn!(tool = name, "Rejected tool call: {}", e);
                return ResponseEnvelope::internal(ErrorKind::BadArguments, e.to_string());
            }
        };

        let credential = self.credentials.get().await;
        if handler.requires_credential() && credential.is_none() {
            warn!(tool = name, "Tool call refused, no credential configured");
            return ResponseEnvelope::upstream_error(CREDENTIAL_MISSING_MESSAGE, None);
        }

        info!(tool = name, args = args.len(), "Tool call");
        let ctx = ToolContext {
            credentials: self.credentials.clone(),
            credential,
        };

        match handler.execute(args, ctx).await {
            Ok(ToolOutcome::Success(data)) => ResponseEnvelope::success(data),
            Ok(ToolOutcome::Failure { message, body }) => {
                warn!(tool = name, "Upstream reported failure: {}", message);
                ResponseEnvelope::upstream_error(message, body)
            }
            Err(e) => Self::classify_failure(name, e),
        }
    }

    fn classify_failure(name: &str, err: anyhow::Error) -> ResponseEnvelope {
        if let Some(call_err) = err.downcast_ref::<UpstreamCallError>() {
            warn!(tool = name, "Error calling Vercel API: {}", call_err);
            return ResponseEnvelope::internal(ErrorKind::Transport, format!("Error: {}", call_err));
        }
        if let Some(bind_err) = err.downcast_ref::<BindError>() {
            warn!(tool = name, "Rejected tool call: {}", bind_err);
            return ResponseEnvelope::internal(ErrorKind::BadArguments, bind_err.to_string());
        }

        error!(tool = name, "Tool failed: {:#}", err);
        ResponseEnvelope::internal(
            ErrorKind::Internal,
            format!("Internal error while running tool '{}'", name),
        )
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.list_names())
            .finish_non_exhaustive()
    }
}
