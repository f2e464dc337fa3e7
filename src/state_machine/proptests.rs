//! Property-based tests for the state machine
//!
//! A small driver applies transcript effects and replays collaborator
//! replies for requests the machine actually dispatched, so invariants are
//! checked against realistic event orderings.

use super::transition::*;
use super::*;
use crate::collaborator::{AskRequest, CollaboratorError, UploadFile, UploadReceipt};
use crate::session::SessionId;
use crate::transcript::{ExchangeEntry, Role, Transcript};
use proptest::prelude::*;
use serde_json::json;
use std::collections::VecDeque;

// ============================================================================
// Driver
// ============================================================================

#[derive(Debug, Clone)]
enum Op {
    Send(String),
    AskReply { ok: bool },
    Upload { has_file: bool },
    UploadReply { ok: bool },
    NewChat,
}

struct Driver {
    context: ChatContext,
    state: ChatState,
    transcript: Transcript,
    pending_asks: VecDeque<AskRequest>,
    pending_uploads: VecDeque<String>,
    sessions_started: u32,
}

impl Driver {
    fn new(context: ChatContext) -> Self {
        Self {
            context,
            state: ChatState::new(SessionId::from("session-0")),
            transcript: Transcript::new(),
            pending_asks: VecDeque::new(),
            pending_uploads: VecDeque::new(),
            sessions_started: 0,
        }
    }

    /// Turn an op into an event, or `None` when it has nothing to reply to
    fn event_for(&mut self, op: Op) -> Option<Event> {
        match op {
            Op::Send(text) => Some(Event::UserMessage { text }),
            Op::AskReply { ok } => {
                let request = self.pending_asks.pop_front()?;
                let outcome = if ok {
                    Ok(json!({ "echo": request.message }))
                } else {
                    Err(CollaboratorError::transport("connection reset"))
                };
                Some(Event::AskCompleted {
                    session_id: request.session_id,
                    outcome,
                })
            }
            Op::Upload { has_file } => Some(Event::UploadRequested {
                file: has_file.then(|| UploadFile::new("doc.pdf", b"%PDF".to_vec())),
            }),
            Op::UploadReply { ok } => {
                let file_name = self.pending_uploads.pop_front()?;
                let outcome = if ok {
                    Ok(UploadReceipt {
                        status: 200,
                        body: None,
                    })
                } else {
                    Err(CollaboratorError::server(500, "bad pdf"))
                };
                Some(Event::UploadCompleted { file_name, outcome })
            }
            Op::NewChat => {
                self.sessions_started += 1;
                Some(Event::NewSession {
                    session_id: SessionId::from(format!("session-{}", self.sessions_started)),
                })
            }
        }
    }

    fn apply(&mut self, result: TransitionResult) {
        self.state = result.new_state;
        for effect in result.effects {
            match effect {
                Effect::AppendEntry { entry } => self.transcript.append(entry),
                Effect::ClearTranscript => self.transcript.clear(),
                Effect::DispatchAsk { request } => self.pending_asks.push_back(request),
                Effect::DispatchUpload { file } => self.pending_uploads.push_back(file.file_name),
                _ => {}
            }
        }
    }
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z ?!]{1,20}",
        Just(String::new()),
        "[ \t\n]{1,4}",
    ]
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => arb_text().prop_map(Op::Send),
        3 => any::<bool>().prop_map(|ok| Op::AskReply { ok }),
        1 => any::<bool>().prop_map(|has_file| Op::Upload { has_file }),
        1 => any::<bool>().prop_map(|ok| Op::UploadReply { ok }),
        1 => Just(Op::NewChat),
    ]
}

fn arb_context() -> impl Strategy<Value = ChatContext> {
    (
        prop_oneof![Just(SendPolicy::Concurrent), Just(SendPolicy::Serialized)],
        prop_oneof![Just(StaleReplyPolicy::Discard), Just(StaleReplyPolicy::Append)],
    )
        .prop_map(|(send_policy, stale_replies)| ChatContext {
            send_policy,
            stale_replies,
        })
}

fn count_role(transcript: &Transcript, role: Role) -> usize {
    transcript.entries().iter().filter(|e| e.role == role).count()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // In-flight counts always equal the requests actually outstanding
    #[test]
    fn prop_flags_track_outstanding_requests(
        context in arb_context(),
        ops in proptest::collection::vec(arb_op(), 0..40),
    ) {
        let mut driver = Driver::new(context);
        for op in ops {
            let Some(event) = driver.event_for(op) else { continue };
            if let Ok(result) = transition(&driver.state, &driver.context, event) {
                driver.apply(result);
            }
            prop_assert_eq!(driver.state.asks_in_flight as usize, driver.pending_asks.len());
            prop_assert_eq!(driver.state.uploads_in_flight as usize, driver.pending_uploads.len());
            prop_assert_eq!(driver.state.sending(), !driver.pending_asks.is_empty());
            prop_assert_eq!(driver.state.uploading(), !driver.pending_uploads.is_empty());
        }
    }

    // Blank input never mutates state, never dispatches
    #[test]
    fn prop_blank_input_rejected(text in "[ \t\r\n]{0,10}", asks in 0u32..3, uploads in 0u32..3) {
        let mut state = ChatState::new(SessionId::from("s"));
        state.asks_in_flight = asks;
        state.uploads_in_flight = uploads;

        let result = transition(&state, &ChatContext::default(), Event::UserMessage { text });
        prop_assert_eq!(result.err(), Some(TransitionError::EmptyMessage));
    }

    // A bot entry is never appended ahead of the user entry it answers
    #[test]
    fn prop_bot_entries_never_outnumber_user_entries(
        context in arb_context(),
        ops in proptest::collection::vec(arb_op(), 0..40),
    ) {
        // Stale appends can land in a fresh transcript, so only check discard mode
        let context = ChatContext { stale_replies: StaleReplyPolicy::Discard, ..context };
        let mut driver = Driver::new(context);
        for op in ops {
            let Some(event) = driver.event_for(op) else { continue };
            if let Ok(result) = transition(&driver.state, &driver.context, event) {
                driver.apply(result);
            }
            let bots = count_role(&driver.transcript, Role::Bot);
            let users = count_role(&driver.transcript, Role::User);
            prop_assert!(bots <= users);
        }
    }

    // Every accepted send appends exactly the raw text, before dispatching it
    #[test]
    fn prop_accepted_send_appends_raw_text_first(text in "[ ]{0,3}[a-z]{1,10}[ ]{0,3}") {
        let state = ChatState::new(SessionId::from("s"));
        let result = transition(
            &state,
            &ChatContext::default(),
            Event::UserMessage { text: text.clone() },
        ).unwrap();

        let append_pos = result.effects.iter().position(|e| matches!(
            e,
            Effect::AppendEntry { entry } if *entry == ExchangeEntry::user(text.clone())
        ));
        let dispatch_pos = result.effects.iter().position(|e| matches!(
            e,
            Effect::DispatchAsk { request } if request.message == text
        ));
        prop_assert!(append_pos.is_some());
        prop_assert!(dispatch_pos.is_some());
        prop_assert!(append_pos < dispatch_pos);
    }

    // A reply for the current session always yields exactly one bot entry
    #[test]
    fn prop_current_reply_yields_one_bot_entry(ok in any::<bool>(), in_flight in 1u32..4) {
        let mut state = ChatState::new(SessionId::from("s"));
        state.asks_in_flight = in_flight;
        let outcome = if ok {
            Ok(json!({ "a": 1 }))
        } else {
            Err(CollaboratorError::decode("bad"))
        };

        let result = transition(
            &state,
            &ChatContext::default(),
            Event::AskCompleted { session_id: SessionId::from("s"), outcome },
        ).unwrap();

        let bot_entries = result.effects.iter().filter(|e| matches!(
            e,
            Effect::AppendEntry { entry } if entry.role == Role::Bot
        )).count();
        prop_assert_eq!(bot_entries, 1);
        prop_assert_eq!(result.new_state.asks_in_flight, in_flight - 1);
    }

    // Reset always yields an empty transcript under the new id
    #[test]
    fn prop_reset_clears_transcript(
        ops in proptest::collection::vec(arb_op(), 0..30),
    ) {
        let mut driver = Driver::new(ChatContext::default());
        for op in ops {
            let Some(event) = driver.event_for(op) else { continue };
            if let Ok(result) = transition(&driver.state, &driver.context, event) {
                driver.apply(result);
            }
        }

        let previous = driver.state.session_id.clone();
        let event = driver.event_for(Op::NewChat).unwrap();
        let result = transition(&driver.state, &driver.context, event).unwrap();
        driver.apply(result);

        prop_assert!(driver.transcript.is_empty());
        prop_assert_ne!(driver.state.session_id, previous);
    }
}
