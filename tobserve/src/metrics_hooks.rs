//! Metrics-based hooks for provider calls, tool execution, and orchestration phases.
//!
//! ```rust
//! use tobserve::MetricsObservabilityHooks;
//! use tprovider::ProviderOperationHooks;
//!
//! fn accepts_provider_hooks(_hooks: &dyn ProviderOperationHooks) {}
//!
//! let hooks = MetricsObservabilityHooks;
//! accepts_provider_hooks(&hooks);
//! ```

use std::time::Duration;

use serde_json::Value;
use tcommon::TraceId;
use tplan::{OrchestrationError, OrchestrationHooks, OrchestrationPhase, Outcome};
use tprovider::{Completion, ProviderError, ProviderId, ProviderOperationHooks};
use ttooling::{ToolError, ToolInvocation, ToolRuntimeHooks};

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObservabilityHooks;

impl ProviderOperationHooks for MetricsObservabilityHooks {
    fn on_request_start(&self, provider: ProviderId, model: &str) {
        metrics::counter!(
            "toolwire_provider_request_start_total",
            "provider" => provider.to_string(),
            "model" => model.to_string()
        )
        .increment(1);
    }

    fn on_request_success(
        &self,
        provider: ProviderId,
        model: &str,
        completion: &Completion,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "toolwire_provider_request_success_total",
            "provider" => provider.to_string(),
            "model" => model.to_string()
        )
        .increment(1);
        metrics::counter!(
            "toolwire_provider_tokens_total",
            "provider" => provider.to_string(),
            "model" => model.to_string()
        )
        .increment(u64::from(completion.usage.total_tokens));
        metrics::histogram!(
            "toolwire_provider_request_duration_seconds",
            "provider" => provider.to_string(),
            "status" => "success"
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_request_failure(
        &self,
        provider: ProviderId,
        model: &str,
        error: &ProviderError,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "toolwire_provider_request_failure_total",
            "provider" => provider.to_string(),
            "model" => model.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "toolwire_provider_request_duration_seconds",
            "provider" => provider.to_string(),
            "status" => "failure"
        )
        .record(elapsed.as_secs_f64());
    }
}

impl ToolRuntimeHooks for MetricsObservabilityHooks {
    fn on_execution_start(&self, invocation: &ToolInvocation) {
        metrics::counter!(
            "toolwire_tool_execution_start_total",
            "tool_name" => invocation.tool_name.clone()
        )
        .increment(1);
    }

    fn on_execution_success(&self, invocation: &ToolInvocation, _value: &Value, elapsed: Duration) {
        metrics::counter!(
            "toolwire_tool_execution_success_total",
            "tool_name" => invocation.tool_name.clone()
        )
        .increment(1);
        metrics::histogram!(
            "toolwire_tool_execution_duration_seconds",
            "tool_name" => invocation.tool_name.clone(),
            "status" => "success"
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_execution_failure(
        &self,
        invocation: &ToolInvocation,
        error: &ToolError,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "toolwire_tool_execution_failure_total",
            "tool_name" => invocation.tool_name.clone(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "toolwire_tool_execution_duration_seconds",
            "tool_name" => invocation.tool_name.clone(),
            "status" => "failure"
        )
        .record(elapsed.as_secs_f64());
    }
}

impl OrchestrationHooks for MetricsObservabilityHooks {
    fn on_phase_start(&self, phase: OrchestrationPhase, _trace_id: &TraceId) {
        metrics::counter!("toolwire_orchestration_phase_start_total", "phase" => phase.as_str())
            .increment(1);
    }

    fn on_phase_success(&self, phase: OrchestrationPhase, _trace_id: &TraceId, elapsed: Duration) {
        metrics::histogram!(
            "toolwire_orchestration_phase_duration_seconds",
            "phase" => phase.as_str(),
            "status" => "success"
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_phase_failure(
        &self,
        phase: OrchestrationPhase,
        _trace_id: &TraceId,
        error: &OrchestrationError,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "toolwire_orchestration_phase_failure_total",
            "phase" => phase.as_str(),
            "error_kind" => error.kind.as_str()
        )
        .increment(1);
        metrics::histogram!(
            "toolwire_orchestration_phase_duration_seconds",
            "phase" => phase.as_str(),
            "status" => "failure"
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_outcome(&self, _trace_id: &TraceId, outcome: &Outcome, elapsed: Duration) {
        metrics::counter!("toolwire_requests_total", "outcome" => outcome.label()).increment(1);
        metrics::histogram!("toolwire_request_duration_seconds", "outcome" => outcome.label())
            .record(elapsed.as_secs_f64());
    }
}
