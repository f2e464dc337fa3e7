//! Events that can occur in a chat session

use crate::collaborator::{CollaboratorError, UploadFile, UploadReceipt};
use crate::session::SessionId;
use serde_json::Value;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User intents
    UserMessage {
        text: String,
    },
    UploadRequested {
        file: Option<UploadFile>,
    },
    NewSession {
        session_id: SessionId,
    },

    // Collaborator outcomes
    AskCompleted {
        /// Session the request was issued for
        session_id: SessionId,
        outcome: Result<Value, CollaboratorError>,
    },
    UploadCompleted {
        file_name: String,
        outcome: Result<UploadReceipt, CollaboratorError>,
    },
}
