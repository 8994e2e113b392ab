//! Tool handler registry and the tools the bridge exposes.
//!
//! Tools are registered once at startup; `ToolRegistry::invoke` is the
//! single dispatch point used by the HTTP layer.

mod params;
mod registry;

pub use params::{BindError, JsonObject, ParamSpec, ToolArgs};
pub use registry::{
    CREDENTIAL_MISSING_MESSAGE, RegistryError, ToolContext, ToolDescriptor, ToolFuture,
    ToolHandler, ToolOutcome, ToolRegistry,
};

// Tool handler implementations
mod server_status;
mod set_credential;
mod vercel;

pub use server_status::ServerStatusHandler;
pub use set_credential::SetCredentialHandler;
pub use vercel::{DEFAULT_DEPLOYMENT_LIMIT, VercelCatalogue, VercelTool};
