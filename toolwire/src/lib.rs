//! Unified facade over the toolwire workspace crates.
//!
//! Most applications depend on this crate alone. It re-exports the tool,
//! channel, provider, planning and observability layers, and adds the
//! configuration and wiring used by the `toolwire` and `toolwire-server`
//! binaries.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use toolwire::{LocalEndpoint, ToolEndpoint, math_tool_runtime, tw_invocation};
//!
//! # let rt = tokio::runtime::Runtime::new().expect("runtime");
//! # rt.block_on(async {
//! let runtime = math_tool_runtime().expect("math tools");
//! let endpoint = LocalEndpoint::new("math", Arc::new(runtime));
//!
//! let result = endpoint.call(tw_invocation!(multiply, {"a": 6, "b": 7})).await;
//! assert_eq!(result.value(), Some(&serde_json::json!(42)));
//! # });
//! ```

mod config;
mod error;
mod logging;
mod macros;
mod providers;
mod servers;

pub mod prelude;
pub mod runtime;

pub use serde_json;
pub use tchannel;
pub use tcommon;
pub use tobserve;
pub use tplan;
pub use tprovider;
pub use ttooling;

pub use tchannel::{
    ChannelError, ChannelErrorKind, DEFAULT_CALL_TIMEOUT, EndpointSet, LocalEndpoint,
    ServerCommand, ToolClient, ToolEndpoint, ToolServer,
};
pub use tcommon::{BoxFuture, GenerationOptions, TraceId};
pub use tobserve::{
    MetricsObservabilityHooks, SafeOrchestrationHooks, SafeProviderHooks, SafeToolHooks,
    TracingObservabilityHooks,
};
pub use tplan::{
    CompletionResolver, DEFAULT_COMPLETION_TIMEOUT, IntentResolver, OrchestrationHooks,
    Orchestrator, OrchestratorBuilder, Outcome, ParseFailure, ResolveError, Resolution, interpret,
};
pub use tprovider::{
    Completion, CompletionProvider, CompletionRequest, ProviderError, ProviderErrorKind,
    ProviderId, SecretString,
};
pub use ttooling::{
    Catalog, DefaultToolRuntime, ParamSpec, ParamType, ToolError, ToolErrorKind, ToolInvocation,
    ToolRegistry, ToolResult, ToolRuntime, ToolSpec,
};

pub use config::{ToolwireConfig, default_model};
pub use error::{SetupError, SetupErrorKind};
pub use logging::{init_logging, verbosity_directive};
pub use providers::build_provider;
pub use runtime::{
    DEFAULT_SERVER_NAME, SERVER_BINARY, build_orchestrator, build_resolver, connect,
    connect_endpoints, default_server_command, math_server, math_tool_runtime, observed_provider,
    server_commands,
};
pub use servers::{ServerEntry, ServersFile, expand_placeholders};
