//! Resolver and orchestration error values.
//!
//! ```rust
//! use tplan::{ParseFailure, ResolveError, ResolveErrorKind};
//!
//! let failure = ParseFailure::for_parameter("b", "expected a number");
//! assert_eq!(failure.parameter.as_deref(), Some("b"));
//!
//! let error = ResolveError::timeout("no completion after 60s");
//! assert_eq!(error.kind, ResolveErrorKind::Timeout);
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};

use tcommon::DeadlineElapsed;
use tprovider::ProviderError;
use ttooling::{ToolError, ToolErrorKind};

/// Completion text that could not be turned into a valid invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub message: String,
    pub parameter: Option<String>,
}

impl ParseFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            parameter: None,
        }
    }

    pub fn for_parameter(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            parameter: Some(parameter.into()),
        }
    }
}

impl Display for ParseFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.parameter {
            Some(parameter) => write!(f, "ParseError [param={parameter}]: {}", self.message),
            None => write!(f, "ParseError: {}", self.message),
        }
    }
}

impl Error for ParseFailure {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveErrorKind {
    Completion,
    Timeout,
}

/// The completion collaborator failed; distinct from the resolution outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveError {
    pub kind: ResolveErrorKind,
    pub message: String,
}

impl ResolveError {
    pub fn new(kind: ResolveErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn completion(message: impl Into<String>) -> Self {
        Self::new(ResolveErrorKind::Completion, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ResolveErrorKind::Timeout, message)
    }
}

impl Display for ResolveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ResolveError {}

impl From<ProviderError> for ResolveError {
    fn from(value: ProviderError) -> Self {
        if value.is_timeout() {
            Self::timeout(value.to_string())
        } else {
            Self::completion(value.to_string())
        }
    }
}

impl From<DeadlineElapsed> for ResolveError {
    fn from(value: DeadlineElapsed) -> Self {
        Self::timeout(format!("no completion received: {value}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestrationErrorKind {
    NotReady,
    CatalogUnavailable,
    CompletionFailed,
    CompletionTimeout,
    ParseFailed,
    UnknownTool,
    InvalidArguments,
    ExecutionError,
    TransportError,
}

impl OrchestrationErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotReady => "not_ready",
            Self::CatalogUnavailable => "catalog_unavailable",
            Self::CompletionFailed => "completion_failed",
            Self::CompletionTimeout => "completion_timeout",
            Self::ParseFailed => "parse_failed",
            Self::UnknownTool => "unknown_tool",
            Self::InvalidArguments => "invalid_arguments",
            Self::ExecutionError => "execution_error",
            Self::TransportError => "transport_error",
        }
    }
}

/// What went wrong in a phase, as reported to orchestration hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestrationError {
    pub kind: OrchestrationErrorKind,
    pub message: String,
}

impl OrchestrationError {
    pub fn new(kind: OrchestrationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_ready(message: impl Into<String>) -> Self {
        Self::new(OrchestrationErrorKind::NotReady, message)
    }

    pub fn catalog(error: &ToolError) -> Self {
        Self::new(OrchestrationErrorKind::CatalogUnavailable, error.to_string())
    }
}

impl Display for OrchestrationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for OrchestrationError {}

impl From<&ResolveError> for OrchestrationError {
    fn from(value: &ResolveError) -> Self {
        let kind = match value.kind {
            ResolveErrorKind::Completion => OrchestrationErrorKind::CompletionFailed,
            ResolveErrorKind::Timeout => OrchestrationErrorKind::CompletionTimeout,
        };
        Self::new(kind, value.message.clone())
    }
}

impl From<&ParseFailure> for OrchestrationError {
    fn from(value: &ParseFailure) -> Self {
        Self::new(OrchestrationErrorKind::ParseFailed, value.to_string())
    }
}

impl From<&ToolError> for OrchestrationError {
    fn from(value: &ToolError) -> Self {
        let kind = match value.kind {
            ToolErrorKind::UnknownTool => OrchestrationErrorKind::UnknownTool,
            ToolErrorKind::InvalidArguments => OrchestrationErrorKind::InvalidArguments,
            ToolErrorKind::ExecutionError => OrchestrationErrorKind::ExecutionError,
            ToolErrorKind::TransportError => OrchestrationErrorKind::TransportError,
        };
        Self::new(kind, value.message.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn parse_failure_display_names_parameter() {
        assert_eq!(
            ParseFailure::for_parameter("b", "expected a number").to_string(),
            "ParseError [param=b]: expected a number"
        );
        assert_eq!(
            ParseFailure::new("not JSON").to_string(),
            "ParseError: not JSON"
        );
    }

    #[test]
    fn provider_and_deadline_errors_map_to_resolve_kinds() {
        let completion = ResolveError::from(ProviderError::unavailable("offline"));
        assert_eq!(completion.kind, ResolveErrorKind::Completion);
        assert!(completion.message.contains("offline"));

        let slow_model = ResolveError::from(ProviderError::timeout("read timed out").with_status(504));
        assert_eq!(slow_model.kind, ResolveErrorKind::Timeout);
        assert!(slow_model.message.contains("HTTP 504"));

        let timeout = ResolveError::from(DeadlineElapsed {
            after: Duration::from_secs(2),
        });
        assert_eq!(timeout.kind, ResolveErrorKind::Timeout);
    }

    #[test]
    fn tool_errors_keep_their_kind_for_hooks() {
        let error = OrchestrationError::from(&ToolError::execution("division by zero"));
        assert_eq!(error.kind, OrchestrationErrorKind::ExecutionError);
        assert_eq!(error.kind.as_str(), "execution_error");

        let catalog = OrchestrationError::catalog(&ToolError::transport("pipe closed"));
        assert_eq!(catalog.kind, OrchestrationErrorKind::CatalogUnavailable);
    }
}
