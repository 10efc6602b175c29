//! Tool trait contract for registry-managed capabilities.
//!
//! ```rust
//! use serde_json::json;
//! use ttooling::{FunctionTool, Tool, ToolSpec};
//!
//! let tool = FunctionTool::new(ToolSpec::new("echo", "Echoes input"), |args| async move {
//!     Ok(json!(args))
//! });
//!
//! assert_eq!(tool.spec().name, "echo");
//! assert!(!tool.is_stateful());
//! ```

use std::future::Future;
use std::sync::Arc;

use serde_json::{Map, Value};
use tcommon::BoxFuture;

use crate::{ToolError, ToolSpec};

pub type ToolFuture<'a, T> = BoxFuture<'a, T>;

pub trait Tool: Send + Sync {
    fn spec(&self) -> ToolSpec;

    /// Stateful tools are executed one invocation at a time.
    fn is_stateful(&self) -> bool {
        false
    }

    fn invoke<'a>(
        &'a self,
        arguments: &'a Map<String, Value>,
    ) -> ToolFuture<'a, Result<Value, ToolError>>;
}

type ToolHandler =
    dyn Fn(Map<String, Value>) -> ToolFuture<'static, Result<Value, ToolError>> + Send + Sync;

pub struct FunctionTool {
    spec: ToolSpec,
    stateful: bool,
    handler: Arc<ToolHandler>,
}

impl FunctionTool {
    pub fn new<F, Fut>(spec: ToolSpec, handler: F) -> Self
    where
        F: Fn(Map<String, Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
    {
        let handler: Arc<ToolHandler> = Arc::new(
            move |arguments| -> ToolFuture<'static, Result<Value, ToolError>> {
                Box::pin(handler(arguments))
            },
        );

        Self {
            spec,
            stateful: false,
            handler,
        }
    }

    pub fn stateful(mut self) -> Self {
        self.stateful = true;
        self
    }
}

impl Tool for FunctionTool {
    fn spec(&self) -> ToolSpec {
        self.spec.clone()
    }

    fn is_stateful(&self) -> bool {
        self.stateful
    }

    fn invoke<'a>(
        &'a self,
        arguments: &'a Map<String, Value>,
    ) -> ToolFuture<'a, Result<Value, ToolError>> {
        (self.handler)(arguments.clone())
    }
}
