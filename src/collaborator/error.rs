//! Collaborator error types

use thiserror::Error;

/// Failure reaching or understanding a collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CollaboratorError {
    pub kind: CollaboratorErrorKind,
    pub message: String,
}

impl CollaboratorError {
    pub fn new(kind: CollaboratorErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(CollaboratorErrorKind::Transport, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(CollaboratorErrorKind::Decode, message)
    }

    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::new(CollaboratorErrorKind::Server { status }, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(CollaboratorErrorKind::InvalidInput, message)
    }

    /// Build a transport error from a reqwest failure
    pub(crate) fn from_reqwest(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::transport(format!("Request timeout: {error}"))
        } else if error.is_connect() {
            Self::transport(format!("Connection failed: {error}"))
        } else {
            Self::transport(format!("Request failed: {error}"))
        }
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollaboratorErrorKind {
    /// No response at all: unreachable, reset, timed out
    Transport,
    /// Response body could not be decoded
    Decode,
    /// Collaborator answered with a failure status
    Server { status: u16 },
    /// Request could not be built from the caller's input
    InvalidInput,
}

impl CollaboratorErrorKind {
    pub fn status(self) -> Option<u16> {
        match self {
            Self::Server { status } => Some(status),
            _ => None,
        }
    }
}
