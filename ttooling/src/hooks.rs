//! Runtime hooks for tool execution lifecycle events.
//!
//! ```rust
//! use ttooling::{NoopToolRuntimeHooks, ToolRuntimeHooks};
//!
//! fn assert_hooks_trait(_hooks: &dyn ToolRuntimeHooks) {}
//!
//! let hooks = NoopToolRuntimeHooks;
//! assert_hooks_trait(&hooks);
//! ```

use std::time::Duration;

use serde_json::Value;

use crate::{ToolError, ToolInvocation};

pub trait ToolRuntimeHooks: Send + Sync {
    fn on_execution_start(&self, _invocation: &ToolInvocation) {}

    fn on_execution_success(&self, _invocation: &ToolInvocation, _value: &Value, _elapsed: Duration) {
    }

    fn on_execution_failure(
        &self,
        _invocation: &ToolInvocation,
        _error: &ToolError,
        _elapsed: Duration,
    ) {
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopToolRuntimeHooks;

impl ToolRuntimeHooks for NoopToolRuntimeHooks {}
