//! Hook contracts for observing orchestration phases.
//!
//! ```rust
//! use tplan::{NoopOrchestrationHooks, OrchestrationHooks, OrchestrationPhase};
//!
//! fn accepts_hooks(_hooks: &dyn OrchestrationHooks) {}
//!
//! accepts_hooks(&NoopOrchestrationHooks);
//! assert_eq!(OrchestrationPhase::Resolve.as_str(), "resolve");
//! ```

use std::fmt::{Display, Formatter};
use std::time::Duration;

use tcommon::TraceId;

use crate::{OrchestrationError, Outcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrchestrationPhase {
    Catalog,
    Resolve,
    Invoke,
}

impl OrchestrationPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Catalog => "catalog",
            Self::Resolve => "resolve",
            Self::Invoke => "invoke",
        }
    }
}

impl Display for OrchestrationPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait OrchestrationHooks: Send + Sync {
    fn on_phase_start(&self, _phase: OrchestrationPhase, _trace_id: &TraceId) {}

    fn on_phase_success(&self, _phase: OrchestrationPhase, _trace_id: &TraceId, _elapsed: Duration) {}

    fn on_phase_failure(
        &self,
        _phase: OrchestrationPhase,
        _trace_id: &TraceId,
        _error: &OrchestrationError,
        _elapsed: Duration,
    ) {
    }

    /// Fires once per request, after every phase has finished.
    fn on_outcome(&self, _trace_id: &TraceId, _outcome: &Outcome, _elapsed: Duration) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopOrchestrationHooks;

impl OrchestrationHooks for NoopOrchestrationHooks {}
