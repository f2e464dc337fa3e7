//! Chat state types

use crate::session::SessionId;
use serde::Serialize;
use std::str::FromStr;
use thiserror::Error;

/// Whether a new message may be sent while another request is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SendPolicy {
    /// Dispatch every valid message; the in-flight flag is advisory
    #[default]
    Concurrent,
    /// Reject a message while a send or an upload is outstanding
    Serialized,
}

/// What to do with an ask reply issued for a session that has since been reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StaleReplyPolicy {
    /// Drop the reply; only its in-flight count is released
    #[default]
    Discard,
    /// Append the reply to whatever transcript is current
    Append,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unrecognized policy {0:?}")]
pub struct ParsePolicyError(pub String);

impl FromStr for SendPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "concurrent" => Ok(Self::Concurrent),
            "serialized" | "serial" => Ok(Self::Serialized),
            other => Err(ParsePolicyError(other.to_string())),
        }
    }
}

impl FromStr for StaleReplyPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "discard" => Ok(Self::Discard),
            "append" => Ok(Self::Append),
            other => Err(ParsePolicyError(other.to_string())),
        }
    }
}

/// Immutable behavior switches for a chat runtime
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatContext {
    pub send_policy: SendPolicy,
    pub stale_replies: StaleReplyPolicy,
}

/// Session-scoped orchestration state.
///
/// The transcript lives next to this in the runtime; the state machine only
/// emits `AppendEntry` / `ClearTranscript` effects for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatState {
    pub session_id: SessionId,
    /// Ask requests dispatched and not yet resolved
    pub asks_in_flight: u32,
    /// Uploads dispatched and not yet resolved
    pub uploads_in_flight: u32,
}

impl ChatState {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            asks_in_flight: 0,
            uploads_in_flight: 0,
        }
    }

    pub fn sending(&self) -> bool {
        self.asks_in_flight > 0
    }

    pub fn uploading(&self) -> bool {
        self.uploads_in_flight > 0
    }

    /// Either request kind in flight disables the send affordance
    pub fn can_send(&self) -> bool {
        !self.sending() && !self.uploading()
    }

    pub fn view(&self) -> StateView {
        StateView {
            session_id: self.session_id.clone(),
            sending: self.sending(),
            uploading: self.uploading(),
            can_send: self.can_send(),
        }
    }
}

/// What the presentation layer gets to see of `ChatState`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateView {
    pub session_id: SessionId,
    pub sending: bool,
    pub uploading: bool,
    pub can_send: bool,
}
