//! NewType wrappers for the names that flow through the bridge.
//!
//! Tool names and parameter names are both plain strings on the wire; keeping
//! them as distinct types stops one being passed where the other is expected.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Declares a string-backed name type with lookup by `&str`.
macro_rules! newtype_string {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        // Lets `HashMap<$name, _>` be queried with a plain `&str`.
        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

newtype_string!(
    /// Registered name of a tool (e.g., "list_projects").
    ///
    /// Lookups are exact and case-sensitive; this is the path segment in
    /// `POST /tools/{name}`.
    ToolName
);

newtype_string!(
    /// Name of a single tool parameter (e.g., "project_id").
    ///
    /// Matches the key clients use in the JSON body of a tool call.
    ParamName
);
