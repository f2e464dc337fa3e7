//! Pure state transition function
//!
//! Given the same state, context and event this always returns the same
//! result and performs no I/O. Session ids are generated by the caller and
//! arrive inside `Event::NewSession`.

use super::{ChatContext, ChatState, Effect, Event, Notice, SendPolicy, StaleReplyPolicy};
use crate::collaborator::{AskRequest, CollaboratorError, UploadReceipt};
use crate::transcript::ExchangeEntry;
use serde_json::Value;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ChatState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ChatState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Rejected user intents. The message doubles as the user-facing notice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Please enter a message.")]
    EmptyMessage,
    #[error("No file selected.")]
    NoFileSelected,
    #[error("Still waiting on the previous request, try again when it finishes.")]
    Busy,
}

pub fn transition(
    state: &ChatState,
    context: &ChatContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match event {
        // ============================================================
        // Send
        // ============================================================
        Event::UserMessage { text } => {
            if text.trim().is_empty() {
                return Err(TransitionError::EmptyMessage);
            }
            if context.send_policy == SendPolicy::Serialized && !state.can_send() {
                return Err(TransitionError::Busy);
            }

            let mut next = state.clone();
            next.asks_in_flight = next.asks_in_flight.saturating_add(1);

            let request = AskRequest {
                session_id: state.session_id.clone(),
                message: text.clone(),
            };

            // The user's own words go in untrimmed, ahead of the request
            Ok(TransitionResult::new(next)
                .with_effect(Effect::append(ExchangeEntry::user(text)))
                .with_effect(Effect::ClearInput)
                .with_effect(Effect::PublishState)
                .with_effect(Effect::DispatchAsk { request }))
        }

        Event::AskCompleted {
            session_id,
            outcome,
        } => {
            let mut next = state.clone();
            next.asks_in_flight = next.asks_in_flight.saturating_sub(1);

            if session_id != state.session_id && context.stale_replies == StaleReplyPolicy::Discard
            {
                return Ok(TransitionResult::new(next).with_effect(Effect::PublishState));
            }

            // Entry and flag change land in one transition
            Ok(TransitionResult::new(next)
                .with_effect(Effect::append(ask_outcome_entry(&outcome)))
                .with_effect(Effect::PublishState))
        }

        // ============================================================
        // Upload
        // ============================================================
        Event::UploadRequested { file } => {
            let file = file.ok_or(TransitionError::NoFileSelected)?;

            let mut next = state.clone();
            next.uploads_in_flight = next.uploads_in_flight.saturating_add(1);

            Ok(TransitionResult::new(next)
                .with_effect(Effect::PublishState)
                .with_effect(Effect::DispatchUpload { file }))
        }

        Event::UploadCompleted { file_name, outcome } => {
            let mut next = state.clone();
            next.uploads_in_flight = next.uploads_in_flight.saturating_sub(1);

            Ok(TransitionResult::new(next)
                .with_effect(Effect::notify(upload_outcome_notice(&file_name, &outcome)))
                .with_effect(Effect::PublishState))
        }

        // ============================================================
        // Session reset
        // ============================================================
        Event::NewSession { session_id } => {
            // In-flight counts survive: those requests are still outstanding
            let mut next = state.clone();
            next.session_id = session_id.clone();

            Ok(TransitionResult::new(next)
                .with_effect(Effect::ClearTranscript)
                .with_effect(Effect::AnnounceSession { session_id })
                .with_effect(Effect::PublishState))
        }
    }
}

/// Full response payload as indented JSON, no field selection
pub fn render_response(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn ask_outcome_entry(outcome: &Result<Value, CollaboratorError>) -> ExchangeEntry {
    match outcome {
        Ok(value) => ExchangeEntry::bot(render_response(value)),
        Err(e) => ExchangeEntry::bot(format!("Error: {}", e.message)),
    }
}

fn upload_outcome_notice(
    file_name: &str,
    outcome: &Result<UploadReceipt, CollaboratorError>,
) -> Notice {
    match outcome {
        Ok(receipt) => Notice::info(receipt.describe(file_name)),
        Err(e) => Notice::error(format!("Error uploading file: {}", e.message)),
    }
}
