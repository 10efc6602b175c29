//! Registration table of tools, built once at endpoint startup.

use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::sync::Arc;

use futures_util::lock::Mutex;
use serde_json::{Map, Value};
use tcommon::Registry;

use crate::{Catalog, FunctionTool, Tool, ToolError, ToolSpec};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    DuplicateTool(String),
    InvalidSpec { tool_name: String, reason: String },
}

impl Display for RegistrationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateTool(name) => write!(f, "tool '{name}' is already registered"),
            Self::InvalidSpec { tool_name, reason } => {
                write!(f, "tool '{tool_name}' has an invalid spec: {reason}")
            }
        }
    }
}

impl Error for RegistrationError {}

pub(crate) struct RegisteredTool {
    pub(crate) spec: ToolSpec,
    pub(crate) tool: Arc<dyn Tool>,
    pub(crate) gate: Option<Arc<Mutex<()>>>,
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: Registry<String, RegisteredTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T>(&mut self, tool: T) -> Result<(), RegistrationError>
    where
        T: Tool + 'static,
    {
        let spec = tool.spec();
        check_spec(&spec)?;

        if self.tools.contains_key(spec.name.as_str()) {
            return Err(RegistrationError::DuplicateTool(spec.name));
        }

        let gate = tool.is_stateful().then(|| Arc::new(Mutex::new(())));
        self.tools.insert(
            spec.name.clone(),
            RegisteredTool {
                spec,
                tool: Arc::new(tool),
                gate,
            },
        );
        Ok(())
    }

    pub fn register_fn<F, Fut>(&mut self, spec: ToolSpec, handler: F) -> Result<(), RegistrationError>
    where
        F: Fn(Map<String, Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
    {
        self.register(FunctionTool::new(spec, handler))
    }

    pub fn register_sync_fn<F>(&mut self, spec: ToolSpec, handler: F) -> Result<(), RegistrationError>
    where
        F: Fn(&Map<String, Value>) -> Result<Value, ToolError> + Send + Sync + 'static,
    {
        self.register_fn(spec, move |arguments| {
            let output = handler(&arguments);
            async move { output }
        })
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).map(|entry| Arc::clone(&entry.tool))
    }

    pub(crate) fn entry(&self, name: &str) -> Option<&RegisteredTool> {
        self.tools.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Specs in registration order.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.values().map(|entry| entry.spec.clone()).collect()
    }

    pub fn catalog(&self) -> Catalog {
        Catalog::from_specs(self.specs())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

fn check_spec(spec: &ToolSpec) -> Result<(), RegistrationError> {
    let invalid = |reason: String| RegistrationError::InvalidSpec {
        tool_name: spec.name.clone(),
        reason,
    };

    if spec.name.trim().is_empty() {
        return Err(invalid("name must not be empty".to_string()));
    }

    let mut seen = HashSet::new();
    for param in &spec.parameters {
        if !seen.insert(param.name.as_str()) {
            return Err(invalid(format!("parameter '{}' is declared twice", param.name)));
        }
    }

    Ok(())
}
