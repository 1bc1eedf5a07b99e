//! Error types for remote store calls.

use thiserror::Error;

/// Errors returned by a [`RemoteStore`](super::RemoteStore).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The transport failed before a response arrived (DNS, connect, reset).
    #[error("remote store unreachable: {0}")]
    Unreachable(String),

    /// The server answered but refused the request.
    #[error("remote store rejected request ({code}): {message}")]
    Rejected { code: u16, message: String },

    /// No response within the call deadline.
    #[error("remote store call timed out")]
    Timeout,
}

impl RemoteError {
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::Unreachable(message.into())
    }

    pub fn rejected(code: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            code,
            message: message.into(),
        }
    }

    /// True when the request never got an answer from the server.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Unreachable(_) | Self::Timeout)
    }

    /// Short variant name, used as a structured logging field.
    pub fn variant(&self) -> &'static str {
        match self {
            Self::Unreachable(_) => "unreachable",
            Self::Rejected { .. } => "rejected",
            Self::Timeout => "timeout",
        }
    }
}
