//! Process configuration, read once at startup.
//!
//! ```rust
//! use std::time::Duration;
//!
//! use toolwire::{ProviderId, ToolwireConfig};
//!
//! let config = ToolwireConfig::from_lookup(|key| match key {
//!     "TOOLWIRE_PROVIDER" => Some("ollama".to_string()),
//!     "TOOLWIRE_CALL_TIMEOUT_SECS" => Some("5".to_string()),
//!     _ => None,
//! })
//! .expect("valid config");
//!
//! assert_eq!(config.provider, ProviderId::Ollama);
//! assert_eq!(config.model(), "llama3.2");
//! assert_eq!(config.call_timeout, Duration::from_secs(5));
//! ```

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tchannel::DEFAULT_CALL_TIMEOUT;
use tplan::DEFAULT_COMPLETION_TIMEOUT;
use tprovider::{ProviderId, SecretString};

use crate::SetupError;

pub const ENV_PROVIDER: &str = "TOOLWIRE_PROVIDER";
pub const ENV_MODEL: &str = "TOOLWIRE_MODEL";
pub const ENV_BASE_URL: &str = "TOOLWIRE_BASE_URL";
pub const ENV_API_KEY: &str = "TOOLWIRE_API_KEY";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_COMPLETION_TIMEOUT: &str = "TOOLWIRE_COMPLETION_TIMEOUT_SECS";
pub const ENV_CALL_TIMEOUT: &str = "TOOLWIRE_CALL_TIMEOUT_SECS";
pub const ENV_TEMPERATURE: &str = "TOOLWIRE_TEMPERATURE";
pub const ENV_SERVERS_FILE: &str = "TOOLWIRE_SERVERS_FILE";

#[derive(Debug, Clone, PartialEq)]
pub struct ToolwireConfig {
    pub provider: ProviderId,
    /// Falls back to the provider's default model when unset.
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<SecretString>,
    pub completion_timeout: Duration,
    pub call_timeout: Duration,
    pub temperature: f32,
    pub servers_file: Option<PathBuf>,
}

impl Default for ToolwireConfig {
    fn default() -> Self {
        Self::new(ProviderId::OpenAi)
    }
}

impl ToolwireConfig {
    pub fn new(provider: ProviderId) -> Self {
        Self {
            provider,
            model: None,
            base_url: None,
            api_key: None,
            completion_timeout: DEFAULT_COMPLETION_TIMEOUT,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            temperature: 0.0,
            servers_file: None,
        }
    }

    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, SetupError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env file");
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SetupError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let provider = match read(ENV_PROVIDER) {
            Some(value) => ProviderId::from_str(&value)
                .map_err(|error| SetupError::config(format!("{ENV_PROVIDER}: {}", error.message)))?,
            None => ProviderId::OpenAi,
        };

        let mut config = Self::new(provider);
        config.model = read(ENV_MODEL);
        config.base_url = read(ENV_BASE_URL);
        config.api_key = read(ENV_API_KEY)
            .or_else(|| read(ENV_OPENAI_API_KEY))
            .map(SecretString::new);
        config.servers_file = read(ENV_SERVERS_FILE).map(PathBuf::from);

        if let Some(value) = read(ENV_COMPLETION_TIMEOUT) {
            config.completion_timeout = parse_seconds(ENV_COMPLETION_TIMEOUT, &value)?;
        }
        if let Some(value) = read(ENV_CALL_TIMEOUT) {
            config.call_timeout = parse_seconds(ENV_CALL_TIMEOUT, &value)?;
        }
        if let Some(value) = read(ENV_TEMPERATURE) {
            config.temperature = value.parse().map_err(|_| {
                SetupError::config(format!("{ENV_TEMPERATURE}: '{value}' is not a number"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_provider(mut self, provider: ProviderId) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::new(api_key));
        self
    }

    pub fn with_completion_timeout(mut self, timeout: Duration) -> Self {
        self.completion_timeout = timeout;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_servers_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.servers_file = Some(path.into());
        self
    }

    pub fn model(&self) -> &str {
        match self.model.as_deref() {
            Some(model) => model,
            None => default_model(self.provider),
        }
    }

    pub fn validate(&self) -> Result<(), SetupError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(SetupError::config(format!(
                "temperature {} is outside 0.0..=2.0",
                self.temperature
            )));
        }
        if self.completion_timeout.is_zero() || self.call_timeout.is_zero() {
            return Err(SetupError::config("timeouts must be greater than zero"));
        }
        if self.provider == ProviderId::OpenAi && self.api_key.is_none() && self.base_url.is_none()
        {
            tracing::warn!("no OpenAI API key configured; completions will fail to authenticate");
        }

        Ok(())
    }
}

pub fn default_model(provider: ProviderId) -> &'static str {
    match provider {
        ProviderId::OpenAi => "gpt-4o-mini",
        ProviderId::Ollama => "llama3.2",
    }
}

fn parse_seconds(key: &str, value: &str) -> Result<Duration, SetupError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|seconds| seconds.is_finite() && *seconds > 0.0)
        .map(Duration::from_secs_f64)
        .ok_or_else(|| {
            SetupError::config(format!("{key}: '{value}' is not a positive number of seconds"))
        })
}
