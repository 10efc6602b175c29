//! Free text plus catalog in, one validated invocation (or a typed refusal) out.
//!
//! The completion text is untrusted. [`interpret`] is the only path from
//! model output to a [`ToolInvocation`], and it only emits invocations that
//! pass full catalog validation.
//!
//! ```rust
//! use tplan::{Resolution, interpret};
//! use ttooling::math::{add_spec, subtract_spec};
//! use ttooling::Catalog;
//!
//! let catalog = Catalog::from_specs(vec![add_spec(), subtract_spec()]);
//!
//! let resolution = interpret(r#"{"tool_name":"add","arguments":{"a":5,"b":7}}"#, &catalog);
//! assert!(matches!(resolution, Resolution::Invocation(ref call) if call.tool_name == "add"));
//!
//! let refused = interpret(r#"{"tool_name":"multiply","arguments":{"a":5,"b":7}}"#, &catalog);
//! assert_eq!(refused, Resolution::NoToolApplies);
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Number, Value};
use tcommon::{BoxFuture, GenerationOptions, with_deadline};
use tprovider::{CompletionProvider, CompletionRequest};
use ttooling::{Catalog, ParamType, ToolInvocation, ToolSpec};

use crate::{ParseFailure, ResolveError, build_messages};

pub const DEFAULT_COMPLETION_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Invocation(ToolInvocation),
    NoToolApplies,
    ParseError(ParseFailure),
}

pub trait IntentResolver: Send + Sync {
    fn resolve<'a>(
        &'a self,
        user_text: &'a str,
        catalog: &'a Catalog,
    ) -> BoxFuture<'a, Result<Resolution, ResolveError>>;
}

/// Resolves intent by asking a completion provider for one JSON object.
#[derive(Clone)]
pub struct CompletionResolver {
    provider: Arc<dyn CompletionProvider>,
    model: String,
    options: GenerationOptions,
    json_mode: bool,
    timeout: Duration,
}

impl CompletionResolver {
    pub fn new(provider: Arc<dyn CompletionProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            options: GenerationOptions::default().with_temperature(0.0),
            json_mode: true,
            timeout: DEFAULT_COMPLETION_TIMEOUT,
        }
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_json_mode(mut self, json_mode: bool) -> Self {
        self.json_mode = json_mode;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn request(&self, user_text: &str, catalog: &Catalog) -> CompletionRequest {
        let messages = build_messages(catalog, user_text);
        let mut request =
            CompletionRequest::new(self.model.clone(), messages).with_options(self.options);
        request.json_mode = self.json_mode;
        request
    }
}

impl IntentResolver for CompletionResolver {
    fn resolve<'a>(
        &'a self,
        user_text: &'a str,
        catalog: &'a Catalog,
    ) -> BoxFuture<'a, Result<Resolution, ResolveError>> {
        Box::pin(async move {
            let request = self.request(user_text, catalog);
            let completion = with_deadline(self.timeout, self.provider.complete(request)).await??;
            Ok(interpret(&completion.text, catalog))
        })
    }
}

/// Strictly interprets completion text against `catalog`.
pub fn interpret(text: &str, catalog: &Catalog) -> Resolution {
    match interpret_inner(text, catalog) {
        Ok(Some(invocation)) => Resolution::Invocation(invocation),
        Ok(None) => Resolution::NoToolApplies,
        Err(failure) => Resolution::ParseError(failure),
    }
}

fn interpret_inner(text: &str, catalog: &Catalog) -> Result<Option<ToolInvocation>, ParseFailure> {
    let body = strip_code_fence(text)?;
    let value: Value = serde_json::from_str(body)
        .map_err(|err| ParseFailure::new(format!("completion is not valid JSON: {err}")))?;

    let Value::Object(mut object) = value else {
        return Err(ParseFailure::new("completion must be a single JSON object"));
    };

    let tool_name = match object.remove("tool_name").or_else(|| object.remove("tool")) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(name)) if name.trim().is_empty() => return Ok(None),
        Some(Value::String(name)) => name,
        Some(other) => {
            return Err(ParseFailure::new(format!(
                "tool_name must be a string or null, got {}",
                ttooling::json_type_name(&other)
            )));
        }
    };

    let Some(spec) = catalog.get(&tool_name) else {
        return Ok(None);
    };

    let arguments = match object.remove("arguments") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(arguments)) => arguments,
        Some(other) => {
            return Err(ParseFailure::new(format!(
                "arguments must be an object, got {}",
                ttooling::json_type_name(&other)
            )));
        }
    };

    let arguments = coerce_arguments(spec, arguments)?;
    Ok(Some(ToolInvocation::new(tool_name, arguments)))
}

/// Removes one surrounding Markdown fence; anything else around the JSON is left for the parser to reject.
fn strip_code_fence(text: &str) -> Result<&str, ParseFailure> {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return Ok(trimmed);
    };

    let Some(inner) = rest.strip_suffix("```") else {
        return Err(ParseFailure::new("code fence is never closed"));
    };

    // The info string ends at the first newline, or where the JSON starts on a one-line fence.
    let body = match inner.split_once('\n') {
        Some((info, body)) if !info.contains('{') => body,
        _ => inner.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
    };

    Ok(body.trim())
}

fn coerce_arguments(
    spec: &ToolSpec,
    arguments: Map<String, Value>,
) -> Result<Map<String, Value>, ParseFailure> {
    let mut coerced = Map::new();

    for (name, value) in arguments {
        let param = spec.parameter(&name).ok_or_else(|| {
            ParseFailure::for_parameter(
                name.clone(),
                format!("tool '{}' has no parameter '{name}'", spec.name),
            )
        })?;

        if value.is_null() {
            continue;
        }

        let value = coerce_value(param.param_type, value)
            .map_err(|message| ParseFailure::for_parameter(name.clone(), message))?;
        coerced.insert(name, value);
    }

    if let Some(missing) = spec
        .required_parameters()
        .find(|param| !coerced.contains_key(&param.name))
    {
        return Err(ParseFailure::for_parameter(
            missing.name.clone(),
            format!("missing required parameter '{}'", missing.name),
        ));
    }

    Ok(coerced)
}

fn coerce_value(param_type: ParamType, value: Value) -> Result<Value, String> {
    match (param_type, value) {
        (ParamType::Number, Value::Number(number)) => Ok(Value::Number(number)),
        (ParamType::Number, Value::String(text)) => parse_number(&text)
            .ok_or_else(|| format!("'{text}' is not a number")),
        (ParamType::Integer, Value::Number(number)) => whole_number(&number)
            .ok_or_else(|| format!("{number} is not a whole number")),
        (ParamType::Integer, Value::String(text)) => parse_number(&text)
            .and_then(|value| match value {
                Value::Number(number) => whole_number(&number),
                _ => None,
            })
            .ok_or_else(|| format!("'{text}' is not a whole number")),
        (ParamType::Boolean, Value::Bool(flag)) => Ok(Value::Bool(flag)),
        (ParamType::Boolean, Value::String(text)) => match text.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(format!("'{text}' is not a boolean")),
        },
        (ParamType::String, Value::String(text)) => Ok(Value::String(text)),
        (ParamType::String, Value::Number(number)) => Ok(Value::String(number.to_string())),
        (ParamType::String, Value::Bool(flag)) => Ok(Value::String(flag.to_string())),
        (expected, other) => Err(format!(
            "expected {expected}, got {}",
            ttooling::json_type_name(&other)
        )),
    }
}

fn parse_number(text: &str) -> Option<Value> {
    let text = text.trim();
    if let Ok(integer) = text.parse::<i64>() {
        return Some(Value::from(integer));
    }

    let float = text.parse::<f64>().ok().filter(|float| float.is_finite())?;
    Number::from_f64(float).map(Value::Number)
}

fn whole_number(number: &Number) -> Option<Value> {
    if number.is_i64() || number.is_u64() {
        return Some(Value::Number(number.clone()));
    }

    let float = number.as_f64()?;
    if float.fract() != 0.0 || float.abs() > i64::MAX as f64 {
        return None;
    }

    Some(Value::from(float as i64))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use ttooling::math::{add_spec, subtract_spec};
    use ttooling::{ParamSpec, ToolSpec};

    use super::*;

    fn catalog() -> Catalog {
        Catalog::from_specs(vec![
            add_spec(),
            subtract_spec(),
            ToolSpec::new("repeat", "Repeat a word")
                .with_param(ParamSpec::required("word", ParamType::String))
                .with_param(ParamSpec::optional("times", ParamType::Integer))
                .with_param(ParamSpec::optional("shout", ParamType::Boolean)),
        ])
    }

    fn parse_failure(text: &str) -> ParseFailure {
        match interpret(text, &catalog()) {
            Resolution::ParseError(failure) => failure,
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    fn invocation(text: &str) -> ToolInvocation {
        match interpret(text, &catalog()) {
            Resolution::Invocation(invocation) => invocation,
            other => panic!("expected invocation, got {other:?}"),
        }
    }

    #[test]
    fn well_formed_output_becomes_an_invocation() {
        let call = invocation(r#"{"tool_name":"add","arguments":{"a":5,"b":7}}"#);
        assert_eq!(call.tool_name, "add");
        assert_eq!(call.arguments.get("a"), Some(&json!(5)));
        assert_eq!(call.arguments.get("b"), Some(&json!(7)));
    }

    #[test]
    fn non_json_output_is_a_parse_error() {
        let failure = parse_failure("I think you want the add tool.");
        assert!(failure.message.contains("not valid JSON"));
        assert!(parse_failure("[1, 2]").message.contains("single JSON object"));
    }

    #[test]
    fn unknown_or_null_tool_means_no_tool_applies() {
        let catalog = catalog();
        assert_eq!(
            interpret(r#"{"tool_name":"multiply","arguments":{"a":5,"b":7}}"#, &catalog),
            Resolution::NoToolApplies
        );
        assert_eq!(
            interpret(r#"{"tool_name":null,"arguments":{}}"#, &catalog),
            Resolution::NoToolApplies
        );
        assert_eq!(interpret("{}", &catalog), Resolution::NoToolApplies);
    }

    #[test]
    fn non_string_tool_name_is_a_parse_error() {
        assert!(parse_failure(r#"{"tool_name":7}"#).message.contains("got number"));
    }

    #[test]
    fn tool_key_is_accepted_as_an_alias() {
        let call = invocation(r#"{"tool":"subtract","arguments":{"a":9,"b":4}}"#);
        assert_eq!(call.tool_name, "subtract");
    }

    #[test]
    fn a_single_code_fence_is_stripped() {
        let call = invocation("```json\n{\"tool_name\":\"add\",\"arguments\":{\"a\":1,\"b\":2}}\n```");
        assert_eq!(call.tool_name, "add");

        let prose = parse_failure(
            "Here you go:\n```json\n{\"tool_name\":\"add\",\"arguments\":{\"a\":1,\"b\":2}}\n```",
        );
        assert!(prose.message.contains("not valid JSON"));
        assert!(parse_failure("```json\n{}").message.contains("never closed"));
    }

    #[test]
    fn one_line_fences_are_stripped() {
        let bare = invocation("```{\"tool_name\":\"add\",\"arguments\":{\"a\":1,\"b\":2}}```");
        assert_eq!(bare.tool_name, "add");

        let tagged = invocation("```json {\"tool_name\":\"subtract\",\"arguments\":{\"a\":3,\"b\":1}}```");
        assert_eq!(tagged.tool_name, "subtract");
        assert_eq!(tagged.arguments.get("a"), Some(&json!(3)));

        let empty = parse_failure("``````");
        assert!(empty.message.contains("not valid JSON"));
    }

    #[test]
    fn numeric_strings_are_coerced_for_numeric_parameters() {
        let call = invocation(r#"{"tool_name":"add","arguments":{"a":"5","b":" 2.5 "}}"#);
        assert_eq!(call.arguments.get("a"), Some(&json!(5)));
        assert_eq!(call.arguments.get("b"), Some(&json!(2.5)));

        let failure = parse_failure(r#"{"tool_name":"add","arguments":{"a":"five","b":1}}"#);
        assert_eq!(failure.parameter.as_deref(), Some("a"));
    }

    #[test]
    fn integer_boolean_and_string_coercions() {
        let call = invocation(
            r#"{"tool_name":"repeat","arguments":{"word":42,"times":"3","shout":"TRUE"}}"#,
        );
        assert_eq!(call.arguments.get("word"), Some(&json!("42")));
        assert_eq!(call.arguments.get("times"), Some(&json!(3)));
        assert_eq!(call.arguments.get("shout"), Some(&json!(true)));

        let whole = invocation(r#"{"tool_name":"repeat","arguments":{"word":"hi","times":2.0}}"#);
        assert_eq!(whole.arguments.get("times"), Some(&json!(2)));

        let fractional = parse_failure(r#"{"tool_name":"repeat","arguments":{"word":"hi","times":2.5}}"#);
        assert_eq!(fractional.parameter.as_deref(), Some("times"));

        let object = parse_failure(r#"{"tool_name":"repeat","arguments":{"word":{"x":1}}}"#);
        assert!(object.message.contains("expected string"));
    }

    #[test]
    fn unknown_and_missing_parameters_are_parse_errors() {
        let unknown = parse_failure(r#"{"tool_name":"add","arguments":{"a":1,"b":2,"c":3}}"#);
        assert_eq!(unknown.parameter.as_deref(), Some("c"));

        let missing = parse_failure(r#"{"tool_name":"add","arguments":{"a":1}}"#);
        assert_eq!(missing.parameter.as_deref(), Some("b"));

        let absent = parse_failure(r#"{"tool_name":"add"}"#);
        assert_eq!(absent.parameter.as_deref(), Some("a"));

        let wrong_shape = parse_failure(r#"{"tool_name":"add","arguments":[1,2]}"#);
        assert!(wrong_shape.message.contains("arguments must be an object"));
    }

    #[test]
    fn null_optional_arguments_are_dropped() {
        let call = invocation(r#"{"tool_name":"repeat","arguments":{"word":"hi","times":null}}"#);
        assert!(!call.arguments.contains_key("times"));
    }

    #[test]
    fn every_emitted_invocation_passes_catalog_validation() {
        let catalog = catalog();
        let outputs = [
            r#"{"tool_name":"add","arguments":{"a":"1","b":2}}"#,
            r#"{"tool":"subtract","arguments":{"a":1e3,"b":-4}}"#,
            r#"{"tool_name":"repeat","arguments":{"word":true}}"#,
        ];

        for output in outputs {
            let Resolution::Invocation(call) = interpret(output, &catalog) else {
                panic!("expected invocation for {output}");
            };
            assert!(catalog.validate(&call).is_ok(), "{output}");
        }
    }
}
