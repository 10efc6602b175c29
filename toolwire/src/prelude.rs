//! Common imports for most toolwire applications.

pub use crate::{
    build_orchestrator, build_provider, connect, math_server, math_tool_runtime, tw_command,
    tw_invocation,
};
pub use crate::{
    Catalog, CompletionProvider, EndpointSet, IntentResolver, LocalEndpoint, Orchestrator,
    Outcome, ProviderId, Resolution, ServerCommand, SetupError, ToolClient, ToolEndpoint,
    ToolError, ToolInvocation, ToolResult, ToolRuntime, ToolServer, ToolSpec, ToolwireConfig,
};
