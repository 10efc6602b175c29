use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tchannel::{EndpointFuture, LocalEndpoint, ToolClient, ToolEndpoint, ToolServer};
use tcommon::{BoxFuture, TraceId};
use tplan::prelude::*;
use tplan::{NO_MATCHING_TOOL_MESSAGE, OrchestrationError, OrchestrationErrorKind};
use tprovider::{
    Completion, CompletionProvider, CompletionRequest, FinishReason, ProviderError,
    ProviderFuture, ProviderId, TokenUsage,
};
use ttooling::math::math_registry;
use ttooling::{Catalog, DefaultToolRuntime, ToolError, ToolInvocation, ToolResult};

const ADD_5_7: &str = r#"{"tool_name":"add","arguments":{"a":5,"b":7}}"#;

struct ScriptedProvider {
    reply: Result<String, ProviderError>,
    delay: Option<Duration>,
    prompts: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            delay: None,
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn failing(error: ProviderError) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(error),
            delay: None,
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(ADD_5_7.to_string()),
            delay: Some(delay),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.prompts.lock().expect("prompts lock").len()
    }
}

impl CompletionProvider for ScriptedProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Ollama
    }

    fn complete<'a>(
        &'a self,
        request: CompletionRequest,
    ) -> ProviderFuture<'a, Result<Completion, ProviderError>> {
        Box::pin(async move {
            let model = request.model.clone();
            self.prompts.lock().expect("prompts lock").push(request);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            let text = self.reply.clone()?;
            Ok(Completion {
                provider: ProviderId::Ollama,
                model,
                text,
                finish_reason: FinishReason::Stop,
                usage: TokenUsage::default(),
            })
        })
    }
}

struct CountingEndpoint {
    inner: LocalEndpoint,
    catalog_fetches: AtomicUsize,
    calls: AtomicUsize,
}

impl CountingEndpoint {
    fn math() -> Arc<Self> {
        let runtime = DefaultToolRuntime::new(Arc::new(math_registry().expect("math tools")));
        Arc::new(Self {
            inner: LocalEndpoint::new("math", Arc::new(runtime)),
            catalog_fetches: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        })
    }
}

impl ToolEndpoint for CountingEndpoint {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn fetch_catalog<'a>(&'a self) -> EndpointFuture<'a, Result<Catalog, ToolError>> {
        self.catalog_fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_catalog()
    }

    fn call<'a>(&'a self, invocation: ToolInvocation) -> EndpointFuture<'a, ToolResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.call(invocation)
    }
}

struct DownEndpoint;

impl ToolEndpoint for DownEndpoint {
    fn name(&self) -> &str {
        "down"
    }

    fn fetch_catalog<'a>(&'a self) -> EndpointFuture<'a, Result<Catalog, ToolError>> {
        Box::pin(async { Err(ToolError::transport("endpoint closed the pipe")) })
    }

    fn call<'a>(&'a self, _invocation: ToolInvocation) -> EndpointFuture<'a, ToolResult> {
        Box::pin(async { ToolResult::failure(ToolError::transport("endpoint closed the pipe")) })
    }
}

#[derive(Default)]
struct RecordingHooks {
    events: Mutex<Vec<String>>,
}

impl RecordingHooks {
    fn events(&self) -> Vec<String> {
        self.events.lock().expect("events lock").clone()
    }
}

impl OrchestrationHooks for RecordingHooks {
    fn on_phase_start(&self, phase: OrchestrationPhase, _trace_id: &TraceId) {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("start:{phase}"));
    }

    fn on_phase_success(&self, phase: OrchestrationPhase, _trace_id: &TraceId, _elapsed: Duration) {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("success:{phase}"));
    }

    fn on_phase_failure(
        &self,
        phase: OrchestrationPhase,
        _trace_id: &TraceId,
        error: &OrchestrationError,
        _elapsed: Duration,
    ) {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("failure:{phase}:{}", error.kind.as_str()));
    }

    fn on_outcome(&self, trace_id: &TraceId, outcome: &Outcome, _elapsed: Duration) {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("outcome:{trace_id}:{}", outcome.label()));
    }
}

fn orchestrator(
    provider: Arc<ScriptedProvider>,
    endpoint: Arc<dyn ToolEndpoint>,
) -> Orchestrator {
    let resolver = CompletionResolver::new(provider, "scripted").with_timeout(Duration::from_secs(5));
    Orchestrator::builder()
        .endpoint(endpoint)
        .resolver(Arc::new(resolver))
        .build()
        .expect("orchestrator should build")
}

#[tokio::test]
async fn natural_language_request_reaches_the_add_tool() {
    let provider = ScriptedProvider::replying(ADD_5_7);
    let endpoint = CountingEndpoint::math();
    let orchestrator = orchestrator(provider.clone(), endpoint.clone());

    let reply = orchestrator.handle("What is 5 plus 7?").await;
    assert!(reply.contains("12"), "{reply}");

    let prompts = provider.prompts.lock().expect("prompts lock");
    let request = &prompts[0];
    assert!(request.json_mode);
    assert_eq!(request.options.temperature, Some(0.0));
    assert!(request.messages[0].content.contains("- evaluate_expression:"));
    assert_eq!(request.messages[1].content, "What is 5 plus 7?");
}

#[tokio::test]
async fn run_exposes_the_typed_outcome() {
    let orchestrator = orchestrator(ScriptedProvider::replying(ADD_5_7), CountingEndpoint::math());

    match orchestrator.run("What is 5 plus 7?").await {
        Outcome::Completed { invocation, result } => {
            assert_eq!(invocation.tool_name, "add");
            assert_eq!(result, ToolResult::success(serde_json::json!(12)));
        }
        other => panic!("expected completed outcome, got {other:?}"),
    }
}

#[tokio::test]
async fn no_tool_applies_never_calls_the_endpoint() {
    let endpoint = CountingEndpoint::math();
    let orchestrator = orchestrator(
        ScriptedProvider::replying(r#"{"tool_name":"weather","arguments":{"city":"Oslo"}}"#),
        endpoint.clone(),
    );

    assert_eq!(
        orchestrator.handle("Is it raining in Oslo?").await,
        NO_MATCHING_TOOL_MESSAGE
    );
    assert_eq!(endpoint.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn malformed_completion_is_reported_not_raised() {
    let endpoint = CountingEndpoint::math();
    let orchestrator = orchestrator(
        ScriptedProvider::replying("Sure! Use the add tool with 5 and 7."),
        endpoint.clone(),
    );

    let outcome = orchestrator.run("What is 5 plus 7?").await;
    assert!(matches!(outcome, Outcome::ParseFailed(_)));
    assert!(outcome.render().contains("ParseError"));
    assert_eq!(endpoint.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn provider_failure_and_timeout_are_resolver_errors() {
    let failing = orchestrator(
        ScriptedProvider::failing(ProviderError::unavailable("connection refused")),
        CountingEndpoint::math(),
    );
    match failing.run("What is 5 plus 7?").await {
        Outcome::ResolverFailed(error) => assert_eq!(error.kind, ResolveErrorKind::Completion),
        other => panic!("expected resolver failure, got {other:?}"),
    }

    let resolver = CompletionResolver::new(ScriptedProvider::slow(Duration::from_secs(5)), "slow")
        .with_timeout(Duration::from_millis(50));
    let slow = Orchestrator::builder()
        .endpoint(CountingEndpoint::math())
        .resolver(Arc::new(resolver))
        .build()
        .expect("orchestrator should build");
    match slow.run("What is 5 plus 7?").await {
        Outcome::ResolverFailed(error) => assert_eq!(error.kind, ResolveErrorKind::Timeout),
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_request_does_not_consult_the_model() {
    let provider = ScriptedProvider::replying(ADD_5_7);
    let orchestrator = orchestrator(provider.clone(), CountingEndpoint::math());

    assert_eq!(orchestrator.run("   ").await, Outcome::EmptyRequest);
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn catalog_is_fetched_once_and_reused() {
    let endpoint = CountingEndpoint::math();
    let orchestrator = orchestrator(ScriptedProvider::replying(ADD_5_7), endpoint.clone());

    for _ in 0..3 {
        assert_eq!(orchestrator.handle("What is 5 plus 7?").await, "12");
    }

    assert_eq!(endpoint.catalog_fetches.load(Ordering::SeqCst), 1);
    assert_eq!(endpoint.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn unreachable_endpoint_yields_catalog_unavailable() {
    let provider = ScriptedProvider::replying(ADD_5_7);
    let orchestrator = orchestrator(provider.clone(), Arc::new(DownEndpoint));

    let outcome = orchestrator.run("What is 5 plus 7?").await;
    assert!(matches!(outcome, Outcome::CatalogUnavailable(_)));
    assert!(outcome.render().contains("TransportError"));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn hooks_observe_each_phase_with_the_trace_id() {
    let hooks = Arc::new(RecordingHooks::default());
    let resolver = CompletionResolver::new(
        ScriptedProvider::replying(r#"{"tool_name":"divide","arguments":{"a":5,"b":0}}"#),
        "scripted",
    );
    let orchestrator = Orchestrator::builder()
        .endpoint(CountingEndpoint::math())
        .resolver(Arc::new(resolver))
        .hooks(hooks.clone())
        .build()
        .expect("orchestrator should build");

    let outcome = orchestrator
        .run_traced("divide 5 by 0", &TraceId::new("trace-7"))
        .await;
    assert_eq!(outcome.render(), "ExecutionError: division by zero");

    assert_eq!(
        hooks.events(),
        vec![
            "start:catalog",
            "success:catalog",
            "start:resolve",
            "success:resolve",
            "start:invoke",
            "failure:invoke:execution_error",
            "outcome:trace-7:tool_failure",
        ]
    );

    let failure = OrchestrationError::from(&ParseFailure::new("x"));
    assert_eq!(failure.kind, OrchestrationErrorKind::ParseFailed);
}

#[tokio::test]
async fn orchestration_works_over_the_json_rpc_channel() {
    let runtime = DefaultToolRuntime::new(Arc::new(math_registry().expect("math tools")));
    let (client_side, server_side) = tokio::io::duplex(64 * 1024);
    let server = ToolServer::new(Arc::new(runtime));
    tokio::spawn(async move {
        let (reader, writer) = tokio::io::split(server_side);
        let _ = server.serve(reader, writer).await;
    });

    let (reader, writer) = tokio::io::split(client_side);
    let client = ToolClient::new("math", reader, writer).with_timeout(Duration::from_secs(5));
    client.initialize().await.expect("initialize");

    let orchestrator = orchestrator(
        ScriptedProvider::replying(
            "```json\n{\"tool_name\":\"evaluate_expression\",\"arguments\":{\"expression\":\"2*(3+4)\"}}\n```",
        ),
        Arc::new(client),
    );

    assert_eq!(orchestrator.handle("What is two times three plus four?").await, "14");
}

struct FixedResolver(Resolution);

impl IntentResolver for FixedResolver {
    fn resolve<'a>(
        &'a self,
        _user_text: &'a str,
        _catalog: &'a Catalog,
    ) -> BoxFuture<'a, Result<Resolution, ResolveError>> {
        let resolution = self.0.clone();
        Box::pin(async move { Ok(resolution) })
    }
}

#[tokio::test]
async fn custom_resolvers_plug_into_the_loop() {
    let orchestrator = Orchestrator::builder()
        .endpoint(CountingEndpoint::math())
        .resolver(Arc::new(FixedResolver(Resolution::Invocation(
            ToolInvocation::from_json("subtract", serde_json::json!({"a": 10, "b": 4})),
        ))))
        .build()
        .expect("orchestrator should build");

    assert_eq!(orchestrator.handle("ten minus four").await, "6");
}
