//! Tool layer: specs, catalogs, registration, and execution of tools.

mod args;
mod catalog;
mod error;
mod hooks;
mod registry;
mod runtime;
mod tool;
mod types;

pub mod math;

pub mod prelude {
    pub use crate::{
        Catalog, DefaultToolRuntime, ParamSpec, ParamType, Tool, ToolError, ToolErrorKind,
        ToolFuture, ToolInvocation, ToolRegistry, ToolResult, ToolRuntime, ToolSpec,
    };
}

pub use args::{json_type_name, number_value, required_number, required_string, validate_arguments};
pub use catalog::Catalog;
pub use error::{ToolError, ToolErrorKind};
pub use hooks::{NoopToolRuntimeHooks, ToolRuntimeHooks};
pub use registry::{RegistrationError, ToolRegistry};
pub use runtime::{DefaultToolRuntime, ToolRuntime};
pub use tool::{FunctionTool, Tool, ToolFuture};
pub use types::{ParamSpec, ParamType, ToolInvocation, ToolResult, ToolSpec};
