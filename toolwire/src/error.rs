//! Startup failures while assembling a toolwire runtime.

use std::error::Error;
use std::fmt::{Display, Formatter};

use tchannel::ChannelError;
use tplan::OrchestrationError;
use tprovider::ProviderError;
use ttooling::RegistrationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupErrorKind {
    Config,
    Provider,
    Endpoint,
    Orchestration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupError {
    pub kind: SetupErrorKind,
    pub message: String,
}

impl SetupError {
    pub fn new(kind: SetupErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(SetupErrorKind::Config, message)
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(SetupErrorKind::Provider, message)
    }

    pub fn endpoint(message: impl Into<String>) -> Self {
        Self::new(SetupErrorKind::Endpoint, message)
    }
}

impl Display for SetupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for SetupError {}

impl From<ProviderError> for SetupError {
    fn from(error: ProviderError) -> Self {
        Self::provider(error.to_string())
    }
}

impl From<ChannelError> for SetupError {
    fn from(error: ChannelError) -> Self {
        Self::endpoint(error.to_string())
    }
}

impl From<RegistrationError> for SetupError {
    fn from(error: RegistrationError) -> Self {
        Self::endpoint(error.to_string())
    }
}

impl From<OrchestrationError> for SetupError {
    fn from(error: OrchestrationError) -> Self {
        Self::new(SetupErrorKind::Orchestration, error.to_string())
    }
}
