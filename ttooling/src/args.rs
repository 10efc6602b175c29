//! Argument validation against a [`ToolSpec`] and extraction helpers for tool bodies.
//!
//! ```rust
//! use serde_json::json;
//! use ttooling::{ParamSpec, ParamType, ToolSpec, required_number, validate_arguments};
//!
//! let spec = ToolSpec::new("sqrt", "Square root")
//!     .with_param(ParamSpec::required("x", ParamType::Number));
//! let args = json!({"x": 9}).as_object().cloned().expect("object");
//!
//! validate_arguments(&spec, &args).expect("arguments should validate");
//! assert_eq!(required_number(&args, "x").expect("x should be numeric"), 9.0);
//! ```

use serde_json::{Map, Number, Value};

use crate::{ToolError, ToolSpec};

/// Checks every argument key against the schema, the presence of every required
/// parameter, and the declared type of every supplied value. All violations are
/// reported together.
pub fn validate_arguments(spec: &ToolSpec, arguments: &Map<String, Value>) -> Result<(), ToolError> {
    let mut problems = Vec::new();
    let mut invalid_params = Vec::new();

    for param in &spec.parameters {
        match arguments.get(&param.name) {
            None | Some(Value::Null) if param.required => {
                problems.push(format!("missing required parameter '{}'", param.name));
                invalid_params.push(param.name.clone());
            }
            Some(value) if !value.is_null() && !param.param_type.accepts(value) => {
                problems.push(format!(
                    "parameter '{}' expected {}, got {}",
                    param.name,
                    param.param_type,
                    json_type_name(value)
                ));
                invalid_params.push(param.name.clone());
            }
            _ => {}
        }
    }

    for key in arguments.keys() {
        if spec.parameter(key).is_none() {
            problems.push(format!("unexpected parameter '{key}'"));
            invalid_params.push(key.clone());
        }
    }

    if problems.is_empty() {
        return Ok(());
    }

    Err(ToolError::invalid_arguments(format!(
        "invalid arguments for '{}': {}",
        spec.name,
        problems.join("; ")
    ))
    .with_tool_name(spec.name.clone())
    .with_invalid_params(invalid_params))
}

pub fn required_number(args: &Map<String, Value>, key: &str) -> Result<f64, ToolError> {
    args.get(key)
        .and_then(Value::as_f64)
        .ok_or_else(|| ToolError::invalid_arguments(format!("missing required number: '{key}'")))
}

pub fn required_string(args: &Map<String, Value>, key: &str) -> Result<String, ToolError> {
    args.get(key)
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| ToolError::invalid_arguments(format!("missing required string: '{key}'")))
}

/// Converts an arithmetic result into a JSON number, preferring an integer
/// representation for whole values that fit in `i64`.
pub fn number_value(value: f64) -> Result<Value, ToolError> {
    if !value.is_finite() {
        return Err(ToolError::execution(format!(
            "result is not a finite number ({value})"
        )));
    }

    if value.fract() == 0.0 && value >= i64::MIN as f64 && value < i64::MAX as f64 {
        return Ok(Value::from(value as i64));
    }

    Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| ToolError::execution(format!("result {value} is not representable")))
}

pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
