//! Read-only view of the tools an endpoint exposes, indexed by name.
//!
//! ```rust
//! use serde_json::json;
//! use ttooling::{Catalog, ParamSpec, ParamType, ToolInvocation, ToolSpec};
//!
//! let catalog = Catalog::from_specs(vec![
//!     ToolSpec::new("add", "Add").with_param(ParamSpec::required("a", ParamType::Number)),
//! ]);
//!
//! assert!(catalog.contains("add"));
//! assert!(catalog.validate(&ToolInvocation::from_json("add", json!({"a": 1}))).is_ok());
//! assert!(catalog.validate(&ToolInvocation::from_json("mul", json!({}))).is_err());
//! ```

use tcommon::Registry;

use crate::{ToolError, ToolInvocation, ToolSpec, validate_arguments};

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tools: Registry<String, ToolSpec>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog keeping the first spec seen for each name.
    pub fn from_specs(specs: impl IntoIterator<Item = ToolSpec>) -> Self {
        let mut catalog = Self::new();
        for spec in specs {
            catalog.insert_if_absent(spec);
        }
        catalog
    }

    /// Returns `false` when a tool with the same name is already present.
    pub fn insert_if_absent(&mut self, spec: ToolSpec) -> bool {
        if self.tools.contains_key(spec.name.as_str()) {
            return false;
        }

        self.tools.insert(spec.name.clone(), spec);
        true
    }

    pub fn get(&self, name: &str) -> Option<&ToolSpec> {
        self.tools.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn specs(&self) -> impl Iterator<Item = &ToolSpec> {
        self.tools.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<ToolSpec> {
        self.tools.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Checks the invocation invariant: a known tool name and arguments that
    /// satisfy its schema.
    pub fn validate(&self, invocation: &ToolInvocation) -> Result<&ToolSpec, ToolError> {
        let spec = self.get(&invocation.tool_name).ok_or_else(|| {
            ToolError::unknown_tool(format!(
                "tool '{}' is not in the catalog",
                invocation.tool_name
            ))
            .with_tool_name(invocation.tool_name.clone())
        })?;

        validate_arguments(spec, &invocation.arguments)?;
        Ok(spec)
    }
}

impl FromIterator<ToolSpec> for Catalog {
    fn from_iter<I: IntoIterator<Item = ToolSpec>>(iter: I) -> Self {
        Self::from_specs(iter)
    }
}
