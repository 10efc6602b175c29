use std::sync::Arc;

use serde_json::json;
use ttooling::math::math_registry;
use ttooling::prelude::*;

fn runtime() -> DefaultToolRuntime {
    DefaultToolRuntime::new(Arc::new(math_registry().expect("math tools should register")))
}

async fn call(runtime: &DefaultToolRuntime, name: &str, arguments: serde_json::Value) -> ToolResult {
    runtime
        .invoke(ToolInvocation::from_json(name, arguments))
        .await
}

fn failure_kind(result: &ToolResult) -> Option<ToolErrorKind> {
    result.error().map(|error| error.kind)
}

#[tokio::test]
async fn math_tools_return_correct_values() {
    let runtime = runtime();

    assert_eq!(
        call(&runtime, "add", json!({"a": 5, "b": 7})).await,
        ToolResult::success(json!(12))
    );
    assert_eq!(
        call(&runtime, "subtract", json!({"a": 10, "b": 2.5})).await,
        ToolResult::success(json!(7.5))
    );
    assert_eq!(
        call(&runtime, "multiply", json!({"a": -3, "b": 4})).await,
        ToolResult::success(json!(-12))
    );
    assert_eq!(
        call(&runtime, "divide", json!({"a": 6, "b": 3})).await,
        ToolResult::success(json!(2))
    );
    assert_eq!(
        call(&runtime, "evaluate_expression", json!({"expression": "2*(3+4)"})).await,
        ToolResult::success(json!(14))
    );
}

#[tokio::test]
async fn missing_required_argument_is_invalid_arguments() {
    let result = call(&runtime(), "add", json!({"a": 5})).await;

    assert_eq!(failure_kind(&result), Some(ToolErrorKind::InvalidArguments));
    let error = result.error().expect("failure payload");
    assert_eq!(error.invalid_params, vec!["b".to_string()]);
    assert_eq!(error.tool_name.as_deref(), Some("add"));
}

#[tokio::test]
async fn wrong_typed_argument_is_invalid_arguments() {
    let result = call(&runtime(), "multiply", json!({"a": "5", "b": 2})).await;
    assert_eq!(failure_kind(&result), Some(ToolErrorKind::InvalidArguments));
}

#[tokio::test]
async fn unknown_tool_is_reported() {
    let result = call(&runtime(), "unknown_tool", json!({})).await;
    assert_eq!(failure_kind(&result), Some(ToolErrorKind::UnknownTool));
}

#[tokio::test]
async fn divide_by_zero_is_an_execution_error_and_runtime_keeps_serving() {
    let runtime = runtime();

    let result = call(&runtime, "divide", json!({"a": 5, "b": 0})).await;
    assert_eq!(failure_kind(&result), Some(ToolErrorKind::ExecutionError));

    assert_eq!(
        call(&runtime, "add", json!({"a": 1, "b": 1})).await,
        ToolResult::success(json!(2))
    );
}

#[tokio::test]
async fn expressions_with_names_are_refused() {
    let runtime = runtime();

    for expression in [
        "__import__('os')",
        "open('/etc/passwd').read()",
        "exit()",
        "math.pi * 2",
        "(1).__class__",
    ] {
        let result = call(
            &runtime,
            "evaluate_expression",
            json!({ "expression": expression }),
        )
        .await;
        assert_eq!(
            failure_kind(&result),
            Some(ToolErrorKind::InvalidArguments),
            "{expression}"
        );
    }
}

#[tokio::test]
async fn repeated_calls_are_idempotent() {
    let runtime = runtime();
    let first = call(&runtime, "evaluate_expression", json!({"expression": "7 % 3 + 2 ** 3"})).await;

    for _ in 0..5 {
        let next = call(&runtime, "evaluate_expression", json!({"expression": "7 % 3 + 2 ** 3"})).await;
        assert_eq!(next, first);
    }
    assert_eq!(first, ToolResult::success(json!(9)));
}

#[test]
fn catalog_lists_math_tools_with_schemas() {
    let registry = math_registry().expect("math tools should register");
    let catalog = registry.catalog();

    let add = catalog.get("add").expect("add in catalog");
    assert_eq!(add.json_schema()["required"], json!(["a", "b"]));

    let expression = catalog.get("evaluate_expression").expect("evaluate_expression in catalog");
    assert_eq!(expression.parameters[0].param_type, ParamType::String);
    assert_eq!(runtime().list_tools().len(), 5);
}
