//! Channel-level failures: the connection, the framing, or the peer misbehaved.

use std::error::Error;
use std::fmt::{Display, Formatter};

use tcommon::DeadlineElapsed;
use ttooling::ToolError;

use crate::RpcError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelErrorKind {
    Io,
    Closed,
    Timeout,
    Protocol,
    Remote,
    Spawn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelError {
    pub kind: ChannelErrorKind,
    pub message: String,
}

impl ChannelError {
    pub fn new(kind: ChannelErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ChannelErrorKind::Io, message)
    }

    pub fn closed(message: impl Into<String>) -> Self {
        Self::new(ChannelErrorKind::Closed, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ChannelErrorKind::Timeout, message)
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(ChannelErrorKind::Protocol, message)
    }

    pub fn remote(error: &RpcError) -> Self {
        Self::new(
            ChannelErrorKind::Remote,
            format!("endpoint returned error {}: {}", error.code, error.message),
        )
    }

    pub fn spawn(message: impl Into<String>) -> Self {
        Self::new(ChannelErrorKind::Spawn, message)
    }

    /// The connection cannot carry further requests.
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind, ChannelErrorKind::Io | ChannelErrorKind::Closed)
    }
}

impl Display for ChannelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ChannelError {}

impl From<std::io::Error> for ChannelError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<DeadlineElapsed> for ChannelError {
    fn from(error: DeadlineElapsed) -> Self {
        Self::timeout(format!("no response from endpoint: {error}"))
    }
}

impl From<ChannelError> for ToolError {
    fn from(error: ChannelError) -> Self {
        ToolError::transport(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ttooling::ToolErrorKind;

    use super::*;

    #[test]
    fn channel_errors_become_transport_failures() {
        let error: ToolError = ChannelError::from(DeadlineElapsed {
            after: Duration::from_millis(250),
        })
        .into();

        assert_eq!(error.kind, ToolErrorKind::TransportError);
        assert!(error.message.starts_with("Timeout: no response from endpoint"));
    }

    #[test]
    fn only_connection_failures_are_fatal() {
        assert!(ChannelError::closed("eof").is_fatal());
        assert!(ChannelError::io("broken pipe").is_fatal());
        assert!(!ChannelError::timeout("slow").is_fatal());
        assert!(!ChannelError::protocol("bad version").is_fatal());
    }
}
