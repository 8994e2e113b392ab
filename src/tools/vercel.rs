//! Passthrough tools: one tool, one upstream GET.
//!
//! Each tool is a `VercelTool` built from a path template such as
//! `/v9/projects/{project_id}/domains` plus a mapping from tool parameters to
//! query keys.

use std::sync::Arc;

use anyhow::anyhow;
use serde_json::{Value, json};

use crate::tools::params::{BindError, ParamSpec, ToolArgs};
use crate::tools::registry::{ToolContext, ToolFuture, ToolHandler};
use crate::types::ParamName;
use crate::upstream::VercelClient;

/// Default page size for `list_deployments`.
pub const DEFAULT_DEPLOYMENT_LIMIT: u64 = 5;

/// A tool that maps its arguments onto one upstream endpoint.
pub struct VercelTool {
    name: &'static str,
    description: &'static str,
    path: &'static str,
    /// (parameter name, query key) pairs.
    query: &'static [(&'static str, &'static str)],
    params: Vec<ParamSpec>,
    client: Arc<VercelClient>,
}

impl VercelTool {
    pub fn new(
        client: Arc<VercelClient>,
        name: &'static str,
        description: &'static str,
        path: &'static str,
    ) -> Self {
        Self {
            name,
            description,
            path,
            query: &[],
            params: Vec::new(),
            client,
        }
    }

    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    pub fn query(mut self, query: &'static [(&'static str, &'static str)]) -> Self {
        self.query = query;
        self
    }

    pub fn path_template(&self) -> &str {
        self.path
    }

    /// Expand the path template into URL segments.
    ///
    /// A placeholder whose argument renders empty is treated as missing.
    fn segments(&self, args: &ToolArgs) -> Result<Vec<String>, BindError> {
        self.path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|segment| match placeholder(segment) {
                Some(param) => args
                    .text(param)
                    .ok_or_else(|| BindError::MissingArgument(ParamName::new(param))),
                None => Ok(segment.to_string()),
            })
            .collect()
    }

    /// Query pairs for the bound arguments. Falsy values (`0`, `false`,
    /// `""`, `null`) are left out.
    fn query_pairs(&self, args: &ToolArgs) -> Vec<(&'static str, String)> {
        self.query
            .iter()
            .filter(|(param, _)| args.get(param).is_some_and(is_truthy))
            .filter_map(|(param, key)| args.text(param).map(|value| (*key, value)))
            .collect()
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn placeholder(segment: &str) -> Option<&str> {
    segment.strip_prefix('{')?.strip_suffix('}')
}

impl ToolHandler for VercelTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn parameters(&self) -> &[ParamSpec] {
        &self.params
    }

    fn execute(&self, args: ToolArgs, ctx: ToolContext) -> ToolFuture<'_> {
        Box::pin(async move {
            let credential = ctx
                .credential
                .ok_or_else(|| anyhow!("`{}` dispatched without a credential", self.name))?;

            let segments = self.segments(&args)?;
            let url = self.client.endpoint(&segments, &self.query_pairs(&args))?;
            let outcome = self.client.get(url, &credential).await?;
            Ok(outcome)
        })
    }
}

/// The upstream passthrough tools, one field per tool.
pub struct VercelCatalogue {
    pub list_projects: VercelTool,
    pub list_deployments: VercelTool,
    pub get_project_info: VercelTool,
    pub list_project_domains: VercelTool,
    pub list_environment_variables: VercelTool,
    pub get_user_info: VercelTool,
    pub list_deployment_aliases: VercelTool,
}

impl VercelCatalogue {
    pub fn new(client: Arc<VercelClient>) -> Self {
        let project_id = || ParamSpec::required("project_id", "Vercel project ID or name");

        Self {
            list_projects: VercelTool::new(
                client.clone(),
                "list_projects",
                "List all Vercel projects in your account",
                "/v9/projects",
            ),
            list_deployments: VercelTool::new(
                client.clone(),
                "list_deployments",
                "List recent deployments, optionally filtered by project",
                "/v6/deployments",
            )
            .param(ParamSpec::optional("project_id", "Project ID to filter by"))
            .param(
                ParamSpec::optional("limit", "Maximum number of deployments to show")
                    .with_default(json!(DEFAULT_DEPLOYMENT_LIMIT)),
            )
            .query(&[("project_id", "projectId"), ("limit", "limit")]),
            get_project_info: VercelTool::new(
                client.clone(),
                "get_project_info",
                "Get detailed information about a specific Vercel project by ID",
                "/v9/projects/{project_id}",
            )
            .param(project_id()),
            list_project_domains: VercelTool::new(
                client.clone(),
                "list_project_domains",
                "List all domains associated with a specific Vercel project",
                "/v9/projects/{project_id}/domains",
            )
            .param(project_id()),
            list_environment_variables: VercelTool::new(
                client.clone(),
                "list_environment_variables",
                "List all environment variables for a specific Vercel project",
                "/v9/projects/{project_id}/env",
            )
            .param(project_id()),
            get_user_info: VercelTool::new(
                client.clone(),
                "get_user_info",
                "Get information about the authenticated Vercel user",
                "/v2/user",
            ),
            list_deployment_aliases: VercelTool::new(
                client,
                "list_deployment_aliases",
                "List all aliases for a specific Vercel deployment",
                "/v2/deployments/{deployment_id}/aliases",
            )
            .param(ParamSpec::required("deployment_id", "Vercel deployment ID")),
        }
    }
}
