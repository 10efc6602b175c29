//! Reference calculator tools served by the default endpoint.
//!
//! ```rust
//! use serde_json::json;
//! use ttooling::math::math_registry;
//!
//! let registry = math_registry().expect("math tools should register");
//! let names = registry.specs().into_iter().map(|spec| spec.name).collect::<Vec<_>>();
//!
//! assert_eq!(
//!     names,
//!     vec!["add", "subtract", "multiply", "divide", "evaluate_expression"]
//! );
//! ```

mod expr;

use serde_json::{Map, Value};

use crate::{
    ParamSpec, ParamType, RegistrationError, ToolError, ToolRegistry, ToolSpec, number_value,
    required_number, required_string,
};

pub use expr::{ExprError, MAX_EXPRESSION_LEN, MAX_NESTING_DEPTH, evaluate};

pub const ADD: &str = "add";
pub const SUBTRACT: &str = "subtract";
pub const MULTIPLY: &str = "multiply";
pub const DIVIDE: &str = "divide";
pub const EVALUATE_EXPRESSION: &str = "evaluate_expression";

fn binary_spec(name: &str, description: &str) -> ToolSpec {
    ToolSpec::new(name, description)
        .with_param(ParamSpec::required("a", ParamType::Number).with_description("Left operand"))
        .with_param(ParamSpec::required("b", ParamType::Number).with_description("Right operand"))
}

pub fn add_spec() -> ToolSpec {
    binary_spec(ADD, "Add two numbers and return a + b")
}

pub fn subtract_spec() -> ToolSpec {
    binary_spec(SUBTRACT, "Subtract b from a and return a - b")
}

pub fn multiply_spec() -> ToolSpec {
    binary_spec(MULTIPLY, "Multiply two numbers and return a * b")
}

pub fn divide_spec() -> ToolSpec {
    binary_spec(DIVIDE, "Divide a by b and return a / b")
}

pub fn evaluate_expression_spec() -> ToolSpec {
    ToolSpec::new(
        EVALUATE_EXPRESSION,
        "Evaluate an arithmetic expression using numbers, + - * / %, ** and parentheses",
    )
    .with_param(
        ParamSpec::required("expression", ParamType::String)
            .with_description("Arithmetic expression, for example 2*(3+4)"),
    )
}

fn operands(arguments: &Map<String, Value>) -> Result<(f64, f64), ToolError> {
    Ok((required_number(arguments, "a")?, required_number(arguments, "b")?))
}

fn add(arguments: &Map<String, Value>) -> Result<Value, ToolError> {
    let (a, b) = operands(arguments)?;
    number_value(a + b)
}

fn subtract(arguments: &Map<String, Value>) -> Result<Value, ToolError> {
    let (a, b) = operands(arguments)?;
    number_value(a - b)
}

fn multiply(arguments: &Map<String, Value>) -> Result<Value, ToolError> {
    let (a, b) = operands(arguments)?;
    number_value(a * b)
}

fn divide(arguments: &Map<String, Value>) -> Result<Value, ToolError> {
    let (a, b) = operands(arguments)?;
    if b == 0.0 {
        return Err(ToolError::execution("division by zero"));
    }
    number_value(a / b)
}

fn evaluate_expression(arguments: &Map<String, Value>) -> Result<Value, ToolError> {
    let expression = required_string(arguments, "expression")?;
    let value = evaluate(&expression)?;
    number_value(value)
}

/// Registers the five calculator tools in a fixed order.
pub fn register_math_tools(registry: &mut ToolRegistry) -> Result<(), RegistrationError> {
    registry.register_sync_fn(add_spec(), add)?;
    registry.register_sync_fn(subtract_spec(), subtract)?;
    registry.register_sync_fn(multiply_spec(), multiply)?;
    registry.register_sync_fn(divide_spec(), divide)?;
    registry.register_sync_fn(evaluate_expression_spec(), evaluate_expression)?;
    Ok(())
}

pub fn math_registry() -> Result<ToolRegistry, RegistrationError> {
    let mut registry = ToolRegistry::new();
    register_math_tools(&mut registry)?;
    Ok(registry)
}
