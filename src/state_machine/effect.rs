//! Effects produced by state transitions

use crate::collaborator::{AskRequest, UploadFile};
use crate::session::SessionId;
use crate::transcript::ExchangeEntry;
use serde::Serialize;

/// Effects to be executed after state transition
#[derive(Debug, Clone)]
pub enum Effect {
    /// Append to the current transcript
    AppendEntry { entry: ExchangeEntry },

    /// Empty the transcript (session reset only)
    ClearTranscript,

    /// Tell the presentation to empty its input box
    ClearInput,

    /// Send a message to the ask collaborator (spawns as background task)
    DispatchAsk { request: AskRequest },

    /// Send a document to the upload collaborator (spawns as background task)
    DispatchUpload { file: UploadFile },

    /// Show a transient notice to the user
    Notify { notice: Notice },

    /// Announce the id of a freshly started session
    AnnounceSession { session_id: SessionId },

    /// Publish the new flags to subscribers
    PublishState,
}

impl Effect {
    pub fn append(entry: ExchangeEntry) -> Self {
        Effect::AppendEntry { entry }
    }

    pub fn notify(notice: Notice) -> Self {
        Effect::Notify { notice }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Error,
}

/// User-facing notification; never stored in the transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}
