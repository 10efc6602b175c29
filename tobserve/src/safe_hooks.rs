//! Wrappers that keep a panicking hook from taking down the caller.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use serde_json::Value;
use tcommon::TraceId;
use tplan::{OrchestrationError, OrchestrationHooks, OrchestrationPhase, Outcome};
use tprovider::{Completion, ProviderError, ProviderId, ProviderOperationHooks};
use ttooling::{ToolError, ToolInvocation, ToolRuntimeHooks};

pub struct SafeProviderHooks<H> {
    inner: H,
}

impl<H> SafeProviderHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ProviderOperationHooks for SafeProviderHooks<H>
where
    H: ProviderOperationHooks,
{
    fn on_request_start(&self, provider: ProviderId, model: &str) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_request_start(provider, model)
        }));
    }

    fn on_request_success(
        &self,
        provider: ProviderId,
        model: &str,
        completion: &Completion,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_request_success(provider, model, completion, elapsed)
        }));
    }

    fn on_request_failure(
        &self,
        provider: ProviderId,
        model: &str,
        error: &ProviderError,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_request_failure(provider, model, error, elapsed)
        }));
    }
}

pub struct SafeToolHooks<H> {
    inner: H,
}

impl<H> SafeToolHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ToolRuntimeHooks for SafeToolHooks<H>
where
    H: ToolRuntimeHooks,
{
    fn on_execution_start(&self, invocation: &ToolInvocation) {
        let _ = catch_unwind(AssertUnwindSafe(|| self.inner.on_execution_start(invocation)));
    }

    fn on_execution_success(&self, invocation: &ToolInvocation, value: &Value, elapsed: Duration) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_execution_success(invocation, value, elapsed)
        }));
    }

    fn on_execution_failure(
        &self,
        invocation: &ToolInvocation,
        error: &ToolError,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_execution_failure(invocation, error, elapsed)
        }));
    }
}

pub struct SafeOrchestrationHooks<H> {
    inner: H,
}

impl<H> SafeOrchestrationHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> OrchestrationHooks for SafeOrchestrationHooks<H>
where
    H: OrchestrationHooks,
{
    fn on_phase_start(&self, phase: OrchestrationPhase, trace_id: &TraceId) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_phase_start(phase, trace_id)
        }));
    }

    fn on_phase_success(&self, phase: OrchestrationPhase, trace_id: &TraceId, elapsed: Duration) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_phase_success(phase, trace_id, elapsed)
        }));
    }

    fn on_phase_failure(
        &self,
        phase: OrchestrationPhase,
        trace_id: &TraceId,
        error: &OrchestrationError,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_phase_failure(phase, trace_id, error, elapsed)
        }));
    }

    fn on_outcome(&self, trace_id: &TraceId, outcome: &Outcome, elapsed: Duration) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_outcome(trace_id, outcome, elapsed)
        }));
    }
}
