//! Runtime for executing the chat state machine
//!
//! Owns the live session state and transcript, runs collaborator calls on
//! background tasks and fans out changes to subscribers.

mod executor;


pub use executor::{ChatRuntime, Dispatched};

use crate::collaborator::{
    build_client, HttpAskService, HttpUploadService, LoggingAskService, LoggingUploadService,
};
use crate::config::RelayConfig;
use crate::session::SessionId;
use crate::state_machine::{Notice, StateView};
use crate::transcript::ExchangeEntry;
use serde::Serialize;
use std::sync::Arc;

/// Type alias for production runtime with concrete implementations
pub type RelayRuntime = ChatRuntime<LoggingAskService, LoggingUploadService>;

/// Changes pushed to subscribers, in the order they happened
#[derive(Debug, Clone)]
pub enum ChatEvent {
    Entry { entry: ExchangeEntry },
    StateChange { state: StateView },
    InputCleared,
    SessionReset { session_id: SessionId },
    Notice { notice: Notice },
}

/// Consistent read model for rendering
#[derive(Debug, Clone, Serialize)]
pub struct ChatSnapshot {
    #[serde(flatten)]
    pub state: StateView,
    pub entries: Vec<ExchangeEntry>,
}

/// Wire the HTTP collaborators from configuration
pub fn build_relay_runtime(config: &RelayConfig) -> reqwest::Result<Arc<RelayRuntime>> {
    let client = build_client(config.request_timeout)?;
    let ask = LoggingAskService::new(Arc::new(HttpAskService::new(
        client.clone(),
        config.ask_url.clone(),
    )));
    let upload = LoggingUploadService::new(Arc::new(HttpUploadService::new(
        client,
        config.upload_url.clone(),
    )));

    Ok(Arc::new(ChatRuntime::new(
        config.chat_context(),
        SessionId::new(),
        ask,
        upload,
    )))
}
