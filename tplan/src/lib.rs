//! Intent resolution and the single-step orchestration loop.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use futures_util::FutureExt;
//! use tchannel::LocalEndpoint;
//! use tcommon::BoxFuture;
//! use tplan::{IntentResolver, Orchestrator, ResolveError, Resolution, interpret};
//! use ttooling::math::math_registry;
//! use ttooling::{Catalog, DefaultToolRuntime};
//!
//! struct Scripted;
//!
//! impl IntentResolver for Scripted {
//!     fn resolve<'a>(
//!         &'a self,
//!         _user_text: &'a str,
//!         catalog: &'a Catalog,
//!     ) -> BoxFuture<'a, Result<Resolution, ResolveError>> {
//!         let output = r#"{"tool_name":"multiply","arguments":{"a":6,"b":7}}"#;
//!         Box::pin(async move { Ok(interpret(output, catalog)) })
//!     }
//! }
//!
//! let runtime = DefaultToolRuntime::new(Arc::new(math_registry().expect("math tools")));
//! let orchestrator = Orchestrator::builder()
//!     .endpoint(Arc::new(LocalEndpoint::new("math", Arc::new(runtime))))
//!     .resolver(Arc::new(Scripted))
//!     .build()
//!     .expect("orchestrator");
//!
//! let reply = orchestrator.handle("six times seven").now_or_never().expect("ready");
//! assert_eq!(reply, "42");
//! ```

mod error;
mod hooks;
mod prompt;
mod resolver;
mod service;

pub mod prelude {
    pub use crate::{
        CompletionResolver, IntentResolver, OrchestrationHooks, OrchestrationPhase, Orchestrator,
        OrchestratorBuilder, Outcome, ParseFailure, ResolveError, ResolveErrorKind, Resolution,
    };
}

pub use error::{
    OrchestrationError, OrchestrationErrorKind, ParseFailure, ResolveError, ResolveErrorKind,
};
pub use hooks::{NoopOrchestrationHooks, OrchestrationHooks, OrchestrationPhase};
pub use prompt::{SYSTEM_INSTRUCTIONS, build_messages, render_catalog, render_tool};
pub use resolver::{
    CompletionResolver, DEFAULT_COMPLETION_TIMEOUT, IntentResolver, Resolution, interpret,
};
pub use service::{
    EMPTY_REQUEST_MESSAGE, NO_MATCHING_TOOL_MESSAGE, Orchestrator, OrchestratorBuilder, Outcome,
};
