//! Tracing-based hooks for provider calls, tool execution, and orchestration phases.
//!
//! ```rust
//! use tobserve::TracingObservabilityHooks;
//! use tplan::OrchestrationHooks;
//!
//! fn accepts_orchestration_hooks(_hooks: &dyn OrchestrationHooks) {}
//!
//! let hooks = TracingObservabilityHooks;
//! accepts_orchestration_hooks(&hooks);
//! ```

use std::time::Duration;

use serde_json::Value;
use tcommon::TraceId;
use tplan::{OrchestrationError, OrchestrationHooks, OrchestrationPhase, Outcome};
use tprovider::{Completion, ProviderError, ProviderId, ProviderOperationHooks};
use ttooling::{ToolError, ToolInvocation, ToolRuntimeHooks};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObservabilityHooks;

impl ProviderOperationHooks for TracingObservabilityHooks {
    fn on_request_start(&self, provider: ProviderId, model: &str) {
        tracing::info!(
            phase = "provider",
            event = "request_start",
            provider = %provider,
            model
        );
    }

    fn on_request_success(
        &self,
        provider: ProviderId,
        model: &str,
        completion: &Completion,
        elapsed: Duration,
    ) {
        tracing::info!(
            phase = "provider",
            event = "request_success",
            provider = %provider,
            model,
            finish_reason = ?completion.finish_reason,
            input_tokens = completion.usage.input_tokens,
            output_tokens = completion.usage.output_tokens,
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_request_failure(
        &self,
        provider: ProviderId,
        model: &str,
        error: &ProviderError,
        elapsed: Duration,
    ) {
        tracing::error!(
            phase = "provider",
            event = "request_failure",
            provider = %provider,
            model,
            elapsed_ms = elapsed.as_millis() as u64,
            error_kind = ?error.kind,
            http_status = ?error.status,
            unreachable = error.is_unreachable(),
            error = %error
        );
    }
}

impl ToolRuntimeHooks for TracingObservabilityHooks {
    fn on_execution_start(&self, invocation: &ToolInvocation) {
        tracing::info!(
            phase = "tool",
            event = "execution_start",
            tool_name = %invocation.tool_name,
            arguments = invocation.arguments.len()
        );
    }

    fn on_execution_success(&self, invocation: &ToolInvocation, _value: &Value, elapsed: Duration) {
        tracing::info!(
            phase = "tool",
            event = "execution_success",
            tool_name = %invocation.tool_name,
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_execution_failure(
        &self,
        invocation: &ToolInvocation,
        error: &ToolError,
        elapsed: Duration,
    ) {
        // Bad input is the caller's problem, not an endpoint fault.
        if error.is_user_error() {
            tracing::warn!(
                phase = "tool",
                event = "execution_failure",
                tool_name = %invocation.tool_name,
                elapsed_ms = elapsed.as_millis() as u64,
                error_kind = ?error.kind,
                error = %error
            );
        } else {
            tracing::error!(
                phase = "tool",
                event = "execution_failure",
                tool_name = %invocation.tool_name,
                elapsed_ms = elapsed.as_millis() as u64,
                error_kind = ?error.kind,
                error = %error
            );
        }
    }
}

impl OrchestrationHooks for TracingObservabilityHooks {
    fn on_phase_start(&self, phase: OrchestrationPhase, trace_id: &TraceId) {
        tracing::debug!(
            phase = "orchestration",
            event = "phase_start",
            orchestration_phase = %phase,
            trace_id = %trace_id
        );
    }

    fn on_phase_success(&self, phase: OrchestrationPhase, trace_id: &TraceId, elapsed: Duration) {
        tracing::debug!(
            phase = "orchestration",
            event = "phase_success",
            orchestration_phase = %phase,
            trace_id = %trace_id,
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_phase_failure(
        &self,
        phase: OrchestrationPhase,
        trace_id: &TraceId,
        error: &OrchestrationError,
        elapsed: Duration,
    ) {
        tracing::warn!(
            phase = "orchestration",
            event = "phase_failure",
            orchestration_phase = %phase,
            trace_id = %trace_id,
            elapsed_ms = elapsed.as_millis() as u64,
            error_kind = error.kind.as_str(),
            error = %error
        );
    }

    fn on_outcome(&self, trace_id: &TraceId, outcome: &Outcome, elapsed: Duration) {
        tracing::info!(
            phase = "orchestration",
            event = "request_complete",
            trace_id = %trace_id,
            outcome = outcome.label(),
            elapsed_ms = elapsed.as_millis() as u64
        );
    }
}
