//! The orchestration loop: catalog, resolve, invoke, render.

use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::lock::Mutex;
use serde_json::Value;
use tchannel::ToolEndpoint;
use tcommon::TraceId;
use ttooling::{Catalog, ToolError, ToolInvocation, ToolResult};

use crate::{
    IntentResolver, NoopOrchestrationHooks, OrchestrationError, OrchestrationHooks,
    OrchestrationPhase, ParseFailure, ResolveError, Resolution,
};

pub const NO_MATCHING_TOOL_MESSAGE: &str = "No matching tool for that request.";
pub const EMPTY_REQUEST_MESSAGE: &str = "Please enter a request.";

/// Typed result of one request. Every variant renders to response text.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Completed {
        invocation: ToolInvocation,
        result: ToolResult,
    },
    NoToolApplies,
    ParseFailed(ParseFailure),
    ResolverFailed(ResolveError),
    CatalogUnavailable(ToolError),
    EmptyRequest,
}

impl Outcome {
    /// Stable snake_case label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Completed { result, .. } if result.is_success() => "success",
            Self::Completed { .. } => "tool_failure",
            Self::NoToolApplies => "no_tool_applies",
            Self::ParseFailed(_) => "parse_failed",
            Self::ResolverFailed(_) => "resolver_failed",
            Self::CatalogUnavailable(_) => "catalog_unavailable",
            Self::EmptyRequest => "empty_request",
        }
    }

    pub fn render(&self) -> String {
        match self {
            Self::Completed {
                result: ToolResult::Success { value },
                ..
            } => render_value(value),
            Self::Completed {
                result: ToolResult::Failure(error),
                ..
            } => format!("{:?}: {}", error.kind, error.message),
            Self::NoToolApplies => NO_MATCHING_TOOL_MESSAGE.to_string(),
            Self::ParseFailed(failure) => {
                format!("Could not understand the tool selection. {failure}")
            }
            Self::ResolverFailed(error) => {
                format!("The language model did not produce a tool selection. {error}")
            }
            Self::CatalogUnavailable(error) => format!("Tool catalog unavailable. {error}"),
            Self::EmptyRequest => EMPTY_REQUEST_MESSAGE.to_string(),
        }
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

pub struct OrchestratorBuilder {
    endpoint: Option<Arc<dyn ToolEndpoint>>,
    resolver: Option<Arc<dyn IntentResolver>>,
    hooks: Arc<dyn OrchestrationHooks>,
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self {
            endpoint: None,
            resolver: None,
            hooks: Arc::new(NoopOrchestrationHooks),
        }
    }
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn endpoint(mut self, endpoint: Arc<dyn ToolEndpoint>) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    pub fn resolver(mut self, resolver: Arc<dyn IntentResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn OrchestrationHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn build(self) -> Result<Orchestrator, OrchestrationError> {
        let endpoint = self
            .endpoint
            .ok_or_else(|| OrchestrationError::not_ready("a tool endpoint is required"))?;
        let resolver = self
            .resolver
            .ok_or_else(|| OrchestrationError::not_ready("an intent resolver is required"))?;

        Ok(Orchestrator {
            endpoint,
            resolver,
            hooks: self.hooks,
            catalog: Mutex::new(None),
        })
    }
}

/// Single-step orchestration: one request resolves to at most one tool call.
pub struct Orchestrator {
    endpoint: Arc<dyn ToolEndpoint>,
    resolver: Arc<dyn IntentResolver>,
    hooks: Arc<dyn OrchestrationHooks>,
    catalog: Mutex<Option<Arc<Catalog>>>,
}

impl Orchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    pub fn endpoint(&self) -> &Arc<dyn ToolEndpoint> {
        &self.endpoint
    }

    /// Fetches the catalog on first use and reuses it afterwards. A failed
    /// fetch is not cached, so the next request tries again.
    pub async fn catalog(&self) -> Result<Arc<Catalog>, ToolError> {
        let mut cached = self.catalog.lock().await;
        if let Some(catalog) = cached.as_ref() {
            return Ok(Arc::clone(catalog));
        }

        let catalog = Arc::new(self.endpoint.fetch_catalog().await?);
        *cached = Some(Arc::clone(&catalog));
        Ok(catalog)
    }

    pub async fn handle(&self, user_text: &str) -> String {
        self.run(user_text).await.render()
    }

    pub async fn run(&self, user_text: &str) -> Outcome {
        self.run_traced(user_text, &TraceId::generate()).await
    }

    pub async fn run_traced(&self, user_text: &str, trace_id: &TraceId) -> Outcome {
        let started = Instant::now();
        let outcome = self.run_phases(user_text, trace_id).await;
        self.hooks.on_outcome(trace_id, &outcome, started.elapsed());
        outcome
    }

    async fn run_phases(&self, user_text: &str, trace_id: &TraceId) -> Outcome {
        let user_text = user_text.trim();
        if user_text.is_empty() {
            return Outcome::EmptyRequest;
        }

        let catalog = match self
            .observe(OrchestrationPhase::Catalog, trace_id, self.catalog(), |result| {
                result.as_ref().err().map(OrchestrationError::catalog)
            })
            .await
        {
            Ok(catalog) => catalog,
            Err(error) => return Outcome::CatalogUnavailable(error),
        };

        let resolution = self
            .observe(
                OrchestrationPhase::Resolve,
                trace_id,
                self.resolver.resolve(user_text, &catalog),
                |result| match result {
                    Err(error) => Some(OrchestrationError::from(error)),
                    Ok(Resolution::ParseError(failure)) => Some(OrchestrationError::from(failure)),
                    Ok(_) => None,
                },
            )
            .await;

        let invocation = match resolution {
            Ok(Resolution::Invocation(invocation)) => invocation,
            Ok(Resolution::NoToolApplies) => return Outcome::NoToolApplies,
            Ok(Resolution::ParseError(failure)) => return Outcome::ParseFailed(failure),
            Err(error) => return Outcome::ResolverFailed(error),
        };

        let result = self
            .observe(
                OrchestrationPhase::Invoke,
                trace_id,
                self.endpoint.call(invocation.clone()),
                |result| result.error().map(OrchestrationError::from),
            )
            .await;

        Outcome::Completed { invocation, result }
    }

    async fn observe<T>(
        &self,
        phase: OrchestrationPhase,
        trace_id: &TraceId,
        future: impl Future<Output = T>,
        classify: impl FnOnce(&T) -> Option<OrchestrationError>,
    ) -> T {
        self.hooks.on_phase_start(phase, trace_id);
        let started = Instant::now();
        let output = future.await;
        let elapsed: Duration = started.elapsed();

        match classify(&output) {
            Some(error) => self
                .hooks
                .on_phase_failure(phase, trace_id, &error, elapsed),
            None => self.hooks.on_phase_success(phase, trace_id, elapsed),
        }

        output
    }
}
