//! Tool specification, invocation, and result types shared by every layer.
//!
//! ```rust
//! use serde_json::json;
//! use ttooling::{ParamSpec, ParamType, ToolResult, ToolSpec};
//!
//! let spec = ToolSpec::new("add", "Add two numbers")
//!     .with_param(ParamSpec::required("a", ParamType::Number))
//!     .with_param(ParamSpec::required("b", ParamType::Number));
//!
//! assert_eq!(spec.json_schema()["required"], json!(["a", "b"]));
//! assert_eq!(ToolResult::success(json!(12)).value(), Some(&json!(12)));
//! ```

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::ToolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    Number,
    Integer,
    String,
    Boolean,
}

impl ParamType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Integer => "integer",
            Self::String => "string",
            Self::Boolean => "boolean",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Number | Self::Integer)
    }

    /// Strict type check with no coercion.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Number => value.is_number(),
            Self::Integer => match value {
                Value::Number(number) => {
                    number.is_i64()
                        || number.is_u64()
                        || number.as_f64().is_some_and(|float| float.fract() == 0.0)
                }
                _ => false,
            },
            Self::String => value.is_string(),
            Self::Boolean => value.is_boolean(),
        }
    }
}

impl Display for ParamType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, param_type: ParamType, required: bool) -> Self {
        Self {
            name: name.into(),
            param_type,
            required,
            description: None,
        }
    }

    pub fn required(name: impl Into<String>, param_type: ParamType) -> Self {
        Self::new(name, param_type, true)
    }

    pub fn optional(name: impl Into<String>, param_type: ParamType) -> Self {
        Self::new(name, param_type, false)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<ParamSpec>,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_param(mut self, param: ParamSpec) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&ParamSpec> {
        self.parameters.iter().find(|param| param.name == name)
    }

    pub fn required_parameters(&self) -> impl Iterator<Item = &ParamSpec> {
        self.parameters.iter().filter(|param| param.required)
    }

    pub fn json_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.parameters {
            let mut property = Map::new();
            property.insert("type".to_string(), json!(param.param_type.as_str()));
            if let Some(description) = &param.description {
                property.insert("description".to_string(), json!(description));
            }
            properties.insert(param.name.clone(), Value::Object(property));
        }

        let required = self
            .required_parameters()
            .map(|param| json!(param.name))
            .collect::<Vec<_>>();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    #[serde(rename = "name")]
    pub tool_name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ToolInvocation {
    pub fn new(tool_name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
        }
    }

    /// Builds an invocation from a JSON object literal; non-objects yield no arguments.
    pub fn from_json(tool_name: impl Into<String>, arguments: Value) -> Self {
        let arguments = match arguments {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        Self::new(tool_name, arguments)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ToolResult {
    Success { value: Value },
    Failure(ToolError),
}

impl ToolResult {
    pub fn success(value: Value) -> Self {
        Self::Success { value }
    }

    pub fn failure(error: ToolError) -> Self {
        Self::Failure(error)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Success { value } => Some(value),
            Self::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ToolError> {
        match self {
            Self::Success { .. } => None,
            Self::Failure(error) => Some(error),
        }
    }
}

impl From<Result<Value, ToolError>> for ToolResult {
    fn from(value: Result<Value, ToolError>) -> Self {
        match value {
            Ok(value) => Self::success(value),
            Err(error) => Self::failure(error),
        }
    }
}
