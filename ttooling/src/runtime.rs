//! Tool runtime trait and default registry-backed executor.
//!
//! The runtime is the endpoint-side contract: `list_tools` and `invoke`. Every
//! outcome, including unknown tools, schema violations, tool errors and tool
//! panics, comes back as a [`ToolResult`]; nothing escapes to the caller.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures_util::FutureExt;
use serde_json::Value;

use crate::{
    NoopToolRuntimeHooks, ToolError, ToolFuture, ToolInvocation, ToolRegistry, ToolResult,
    ToolRuntimeHooks, ToolSpec, validate_arguments,
};

pub trait ToolRuntime: Send + Sync {
    fn list_tools(&self) -> Vec<ToolSpec>;

    fn invoke<'a>(&'a self, invocation: ToolInvocation) -> ToolFuture<'a, ToolResult>;
}

#[derive(Clone)]
pub struct DefaultToolRuntime {
    registry: Arc<ToolRegistry>,
    hooks: Arc<dyn ToolRuntimeHooks>,
}

impl Default for DefaultToolRuntime {
    fn default() -> Self {
        Self::new(Arc::new(ToolRegistry::new()))
    }
}

impl DefaultToolRuntime {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            hooks: Arc::new(NoopToolRuntimeHooks),
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ToolRuntimeHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn registry(&self) -> Arc<ToolRegistry> {
        Arc::clone(&self.registry)
    }

    async fn execute(&self, invocation: &ToolInvocation) -> Result<Value, ToolError> {
        let entry = self.registry.entry(&invocation.tool_name).ok_or_else(|| {
            ToolError::unknown_tool(format!(
                "tool '{}' is not registered",
                invocation.tool_name
            ))
        })?;

        validate_arguments(&entry.spec, &invocation.arguments)?;

        let _serialized = match &entry.gate {
            Some(gate) => Some(gate.lock().await),
            None => None,
        };

        let tool = Arc::clone(&entry.tool);
        let arguments = &invocation.arguments;
        let execution = AssertUnwindSafe(async move { tool.invoke(arguments).await });

        match execution.catch_unwind().await {
            Ok(output) => output,
            Err(panic) => Err(ToolError::execution(format!(
                "tool panicked: {}",
                panic_message(panic.as_ref())
            ))),
        }
    }
}

impl ToolRuntime for DefaultToolRuntime {
    fn list_tools(&self) -> Vec<ToolSpec> {
        self.registry.specs()
    }

    fn invoke<'a>(&'a self, invocation: ToolInvocation) -> ToolFuture<'a, ToolResult> {
        Box::pin(async move {
            let started = Instant::now();
            self.hooks.on_execution_start(&invocation);

            match self.execute(&invocation).await {
                Ok(value) => {
                    self.hooks
                        .on_execution_success(&invocation, &value, started.elapsed());
                    ToolResult::success(value)
                }
                Err(error) => {
                    let error = match error.tool_name {
                        Some(_) => error,
                        None => error.with_tool_name(invocation.tool_name.clone()),
                    };
                    self.hooks
                        .on_execution_failure(&invocation, &error, started.elapsed());
                    ToolResult::failure(error)
                }
            }
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }

    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }

    "unknown panic payload".to_string()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::{FunctionTool, ParamSpec, ParamType, ToolErrorKind};

    fn number_spec(name: &str) -> ToolSpec {
        ToolSpec::new(name, "test tool").with_param(ParamSpec::required("x", ParamType::Number))
    }

    fn runtime_with(registry: ToolRegistry) -> DefaultToolRuntime {
        DefaultToolRuntime::new(Arc::new(registry))
    }

    #[tokio::test]
    async fn runtime_executes_registered_tool() {
        let mut registry = ToolRegistry::new();
        registry
            .register_sync_fn(number_spec("double"), |args| {
                Ok(json!(args["x"].as_f64().unwrap_or_default() * 2.0))
            })
            .expect("register");

        let result = runtime_with(registry)
            .invoke(ToolInvocation::from_json("double", json!({"x": 4})))
            .await;

        assert_eq!(result, ToolResult::success(json!(8.0)));
    }

    #[tokio::test]
    async fn runtime_returns_unknown_tool_failure() {
        let result = DefaultToolRuntime::default()
            .invoke(ToolInvocation::from_json("missing", json!({})))
            .await;

        let error = result.error().expect("should fail");
        assert_eq!(error.kind, ToolErrorKind::UnknownTool);
        assert_eq!(error.tool_name.as_deref(), Some("missing"));
    }

    #[tokio::test]
    async fn runtime_rejects_arguments_before_running_the_tool() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = ToolRegistry::new();
        registry
            .register_sync_fn(number_spec("count"), {
                let calls = Arc::clone(&calls);
                move |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Value::Null)
                }
            })
            .expect("register");

        let result = runtime_with(registry)
            .invoke(ToolInvocation::from_json("count", json!({"x": "four"})))
            .await;

        assert_eq!(
            result.error().map(|error| error.kind),
            Some(ToolErrorKind::InvalidArguments)
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn tool_panics_become_execution_errors() {
        let mut registry = ToolRegistry::new();
        registry
            .register_sync_fn(number_spec("explode"), |_| panic!("kaboom"))
            .expect("register explode");
        registry
            .register_sync_fn(number_spec("fine"), |_| Ok(json!("ok")))
            .expect("register fine");
        let runtime = runtime_with(registry);

        let result = runtime
            .invoke(ToolInvocation::from_json("explode", json!({"x": 1})))
            .await;
        let error = result.error().expect("panic should be reported");
        assert_eq!(error.kind, ToolErrorKind::ExecutionError);
        assert!(error.message.contains("kaboom"));

        let next = runtime
            .invoke(ToolInvocation::from_json("fine", json!({"x": 1})))
            .await;
        assert_eq!(next, ToolResult::success(json!("ok")));
    }

    #[tokio::test]
    async fn tool_errors_keep_their_kind_and_gain_tool_name() {
        let mut registry = ToolRegistry::new();
        registry
            .register_sync_fn(number_spec("broken"), |_| Err(ToolError::execution("tool exploded")))
            .expect("register");

        let result = runtime_with(registry)
            .invoke(ToolInvocation::from_json("broken", json!({"x": 1})))
            .await;
        let error = result.error().expect("should fail");
        assert_eq!(error.kind, ToolErrorKind::ExecutionError);
        assert_eq!(error.message, "tool exploded");
        assert_eq!(error.tool_name.as_deref(), Some("broken"));
    }

    #[tokio::test]
    async fn stateful_tools_run_one_invocation_at_a_time() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let mut registry = ToolRegistry::new();
        let tool = FunctionTool::new(number_spec("slow"), {
            let active = Arc::clone(&active);
            let peak = Arc::clone(&peak);
            move |_| {
                let active = Arc::clone(&active);
                let peak = Arc::clone(&peak);
                async move {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    Ok(json!(now))
                }
            }
        })
        .stateful();
        registry.register(tool).expect("register");
        let runtime = runtime_with(registry);

        let calls = (0..4).map(|_| runtime.invoke(ToolInvocation::from_json("slow", json!({"x": 1}))));
        let results = futures_util::future::join_all(calls).await;

        assert!(results.iter().all(ToolResult::is_success));
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[derive(Default)]
    struct RecordingHooks {
        events: Mutex<Vec<String>>,
    }

    impl ToolRuntimeHooks for RecordingHooks {
        fn on_execution_start(&self, invocation: &ToolInvocation) {
            self.events
                .lock()
                .expect("events lock")
                .push(format!("start:{}", invocation.tool_name));
        }

        fn on_execution_success(&self, invocation: &ToolInvocation, _value: &Value, _elapsed: Duration) {
            self.events
                .lock()
                .expect("events lock")
                .push(format!("success:{}", invocation.tool_name));
        }

        fn on_execution_failure(
            &self,
            invocation: &ToolInvocation,
            error: &ToolError,
            _elapsed: Duration,
        ) {
            self.events
                .lock()
                .expect("events lock")
                .push(format!("failure:{}:{:?}", invocation.tool_name, error.kind));
        }
    }

    #[tokio::test]
    async fn hooks_observe_success_and_failure() {
        let hooks = Arc::new(RecordingHooks::default());
        let mut registry = ToolRegistry::new();
        registry
            .register_sync_fn(number_spec("id"), |args| Ok(args["x"].clone()))
            .expect("register");
        let runtime = runtime_with(registry).with_hooks(hooks.clone());

        runtime
            .invoke(ToolInvocation::from_json("id", json!({"x": 1})))
            .await;
        runtime
            .invoke(ToolInvocation::from_json("nope", json!({})))
            .await;

        let events = hooks.events.lock().expect("events lock").clone();
        assert_eq!(
            events,
            vec![
                "start:id".to_string(),
                "success:id".to_string(),
                "start:nope".to_string(),
                "failure:nope:UnknownTool".to_string(),
            ]
        );
    }
}
