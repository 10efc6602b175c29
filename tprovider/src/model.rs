//! Provider-agnostic completion request and response types.
//!
//! ```rust
//! use tprovider::{CompletionRequest, Message, ProviderErrorKind, Role};
//!
//! let ok = CompletionRequest::prompt("gpt-4o-mini", "Pick one tool").json_mode();
//! assert!(ok.validate().is_ok());
//! assert!(ok.json_mode);
//!
//! let err = CompletionRequest::new("", vec![Message::new(Role::User, "hi")])
//!     .validate()
//!     .expect_err("empty model should fail");
//! assert_eq!(err.kind, ProviderErrorKind::InvalidRequest);
//! ```

use std::fmt::{Display, Formatter};

use tcommon::GenerationOptions;

use crate::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenAi,
    Ollama,
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let id = match self {
            Self::OpenAi => "openai",
            Self::Ollama => "ollama",
        };

        f.write_str(id)
    }
}

impl std::str::FromStr for ProviderId {
    type Err = ProviderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(ProviderError::invalid_request(format!(
                "unknown provider '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub provider: ProviderId,
    pub model: String,
    pub text: String,
    pub finish_reason: FinishReason,
    pub usage: TokenUsage,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub options: GenerationOptions,
    /// Ask the provider to constrain output to a single JSON object.
    pub json_mode: bool,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            options: GenerationOptions::default(),
            json_mode: false,
        }
    }

    /// A single user message carrying the whole prompt.
    pub fn prompt(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self::new(model, vec![Message::user(prompt)])
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.options.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.options.max_tokens = Some(max_tokens);
        self
    }

    pub fn json_mode(mut self) -> Self {
        self.json_mode = true;
        self
    }

    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.model.trim().is_empty() {
            return Err(ProviderError::invalid_request("model must not be empty"));
        }

        if self.messages.is_empty() {
            return Err(ProviderError::invalid_request(
                "at least one message is required",
            ));
        }

        if self.options.max_tokens == Some(0) {
            return Err(ProviderError::invalid_request(
                "max_tokens must be greater than zero",
            ));
        }

        if let Some(temperature) = self.options.temperature
            && !(0.0..=2.0).contains(&temperature)
        {
            return Err(ProviderError::invalid_request(
                "temperature must be in the inclusive range 0.0..=2.0",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProviderErrorKind;

    #[test]
    fn provider_id_display_is_stable() {
        assert_eq!(ProviderId::OpenAi.to_string(), "openai");
        assert_eq!(ProviderId::Ollama.to_string(), "ollama");
        assert_eq!("OpenAI".parse::<ProviderId>(), Ok(ProviderId::OpenAi));
        assert!("claude".parse::<ProviderId>().is_err());
    }

    #[test]
    fn validate_enforces_request_contract() {
        let no_messages = CompletionRequest::new("gpt", Vec::new());
        assert_eq!(
            no_messages.validate().expect_err("no messages").kind,
            ProviderErrorKind::InvalidRequest
        );

        let hot = CompletionRequest::prompt("gpt", "hi").with_temperature(2.5);
        assert!(hot.validate().is_err());

        let zero = CompletionRequest::prompt("gpt", "hi").with_max_tokens(0);
        assert!(zero.validate().is_err());

        let valid = CompletionRequest::prompt("gpt", "hi")
            .with_temperature(0.0)
            .with_max_tokens(256);
        assert!(valid.validate().is_ok());
        assert_eq!(valid.messages[0].role, Role::User);
    }
}
