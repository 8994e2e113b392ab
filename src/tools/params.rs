//! Parameter declarations and binding of JSON call bodies to them.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::types::ParamName;

/// JSON object of parameters as received in a tool call body.
pub type JsonObject = Map<String, Value>;

/// Declaration of a single tool parameter.
#[derive(Debug, Clone, Serialize)]
pub struct ParamSpec {
    pub name: ParamName,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    pub description: String,
}

impl ParamSpec {
    pub fn required(name: &str, description: &str) -> Self {
        Self {
            name: ParamName::new(name),
            required: true,
            default: None,
            description: description.to_string(),
        }
    }

    pub fn optional(name: &str, description: &str) -> Self {
        Self {
            name: ParamName::new(name),
            required: false,
            default: None,
            description: description.to_string(),
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// Binding failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    MissingArgument(ParamName),
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingArgument(name) => write!(f, "Missing required argument: {}", name),
        }
    }
}

impl std::error::Error for BindError {}

/// Arguments bound to a tool's declared parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArgs {
    values: HashMap<ParamName, Value>,
}

impl ToolArgs {
    /// Bind `params` to `specs`.
    ///
    /// Keys not declared in `specs` are dropped. Declared defaults fill in
    /// absent optional parameters. A required parameter that is absent or
    /// `null` is an error.
    pub fn bind(specs: &[ParamSpec], mut params: JsonObject) -> Result<Self, BindError> {
        let mut values = HashMap::with_capacity(specs.len());

        for spec in specs {
            match params.remove(spec.name.as_str()) {
                Some(Value::Null) | None if spec.required => {
                    return Err(BindError::MissingArgument(spec.name.clone()));
                }
                Some(value) => {
                    values.insert(spec.name.clone(), value);
                }
                None => {
                    if let Some(default) = &spec.default {
                        values.insert(spec.name.clone(), default.clone());
                    }
                }
            }
        }

        Ok(Self { values })
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Argument rendered as text for a URL.
    ///
    /// Strings are used as-is, other scalars and composites as their JSON
    /// text. `null` and the empty string count as absent.
    pub fn text(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
