//! Chat runtime executor

use super::{ChatEvent, ChatSnapshot};
use crate::collaborator::{AskService, CollaboratorError, UploadFile, UploadService};
use crate::session::SessionId;
use crate::state_machine::{
    transition, ChatContext, ChatState, Effect, Event, Notice, NoticeLevel, TransitionError,
};
use crate::transcript::Transcript;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

const BROADCAST_CAPACITY: usize = 256;

/// State and transcript change together, under one lock
struct ChatCore {
    state: ChatState,
    transcript: Transcript,
}

/// Generic chat runtime that can work with any ask and upload implementations
pub struct ChatRuntime<A, U>
where
    A: AskService + 'static,
    U: UploadService + 'static,
{
    context: ChatContext,
    core: Mutex<ChatCore>,
    ask: Arc<A>,
    upload: Arc<U>,
    broadcast_tx: broadcast::Sender<ChatEvent>,
}

/// Background collaborator calls started by one dispatch.
///
/// Dropping it leaves the calls running; awaiting `settled` waits for them
/// and for their outcomes to be recorded.
#[derive(Debug, Default)]
pub struct Dispatched {
    tasks: Vec<JoinHandle<()>>,
}

impl Dispatched {
    pub async fn settled(self) {
        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Collaborator task did not complete");
            }
        }
    }
}

impl<A, U> ChatRuntime<A, U>
where
    A: AskService + 'static,
    U: UploadService + 'static,
{
    pub fn new(context: ChatContext, session_id: SessionId, ask: A, upload: U) -> Self {
        let (broadcast_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            context,
            core: Mutex::new(ChatCore {
                state: ChatState::new(session_id),
                transcript: Transcript::new(),
            }),
            ask: Arc::new(ask),
            upload: Arc::new(upload),
            broadcast_tx,
        }
    }

    pub fn send_message(
        self: &Arc<Self>,
        text: impl Into<String>,
    ) -> Result<Dispatched, TransitionError> {
        self.dispatch(Event::UserMessage { text: text.into() })
    }

    pub fn upload_file(
        self: &Arc<Self>,
        file: Option<UploadFile>,
    ) -> Result<Dispatched, TransitionError> {
        self.dispatch(Event::UploadRequested { file })
    }

    /// Start a new session with an empty transcript
    pub fn new_chat(self: &Arc<Self>) -> SessionId {
        let session_id = SessionId::new();
        if let Err(e) = self.dispatch(Event::NewSession {
            session_id: session_id.clone(),
        }) {
            tracing::error!(error = %e, "Session reset rejected");
        }
        session_id
    }

    pub fn snapshot(&self) -> ChatSnapshot {
        let core = self.lock_core();
        ChatSnapshot {
            state: core.state.view(),
            entries: core.transcript.snapshot(),
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.lock_core().state.session_id.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.broadcast_tx.subscribe()
    }

    /// Snapshot plus a receiver that starts exactly where the snapshot ends
    pub fn watch(&self) -> (ChatSnapshot, broadcast::Receiver<ChatEvent>) {
        let core = self.lock_core();
        let rx = self.subscribe();
        let snapshot = ChatSnapshot {
            state: core.state.view(),
            entries: core.transcript.snapshot(),
        };
        (snapshot, rx)
    }

    /// Run one event through the state machine and carry out its effects.
    ///
    /// Everything up to spawning collaborator calls happens under the core
    /// lock, so snapshots and subscribers never see half a transition.
    pub fn dispatch(self: &Arc<Self>, event: Event) -> Result<Dispatched, TransitionError> {
        let mut core = self.lock_core();

        let result = match transition(&core.state, &self.context, event) {
            Ok(r) => r,
            Err(e) => {
                // Rejections are user-facing (e.g. "Please enter a message.")
                tracing::info!(reason = %e, "User intent rejected");
                self.publish(ChatEvent::Notice {
                    notice: Notice::error(e.to_string()),
                });
                return Err(e);
            }
        };

        core.state = result.new_state;

        let mut dispatched = Dispatched::default();
        for effect in result.effects {
            if let Some(task) = self.execute_effect(&mut core, effect) {
                dispatched.tasks.push(task);
            }
        }
        Ok(dispatched)
    }

    /// Execute an effect, returning the background task it started, if any
    fn execute_effect(
        self: &Arc<Self>,
        core: &mut ChatCore,
        effect: Effect,
    ) -> Option<JoinHandle<()>> {
        match effect {
            Effect::AppendEntry { entry } => {
                core.transcript.append(entry.clone());
                self.publish(ChatEvent::Entry { entry });
                None
            }

            Effect::ClearTranscript => {
                if !core.transcript.is_empty() {
                    tracing::debug!(entries = core.transcript.len(), "Clearing transcript");
                }
                core.transcript.clear();
                None
            }

            Effect::ClearInput => {
                self.publish(ChatEvent::InputCleared);
                None
            }

            Effect::PublishState => {
                self.publish(ChatEvent::StateChange {
                    state: core.state.view(),
                });
                None
            }

            Effect::AnnounceSession { session_id } => {
                tracing::info!(session_id = %session_id, "Started new chat session");
                self.publish(ChatEvent::SessionReset { session_id });
                None
            }

            Effect::Notify { notice } => {
                match notice.level {
                    NoticeLevel::Info => tracing::info!(notice = %notice.text, "Notice"),
                    NoticeLevel::Error => tracing::warn!(notice = %notice.text, "Notice"),
                }
                self.publish(ChatEvent::Notice { notice });
                None
            }

            Effect::DispatchAsk { request } => {
                let runtime = Arc::clone(self);
                Some(tokio::spawn(async move {
                    tracing::info!(
                        session_id = %request.session_id,
                        "Dispatching ask request (background)"
                    );

                    let outcome = settle("ask", runtime.ask.ask(&request)).await;
                    let event = Event::AskCompleted {
                        session_id: request.session_id,
                        outcome,
                    };
                    if let Err(e) = runtime.dispatch(event) {
                        tracing::error!(error = %e, "Failed to record ask outcome");
                    }
                }))
            }

            Effect::DispatchUpload { file } => {
                let runtime = Arc::clone(self);
                Some(tokio::spawn(async move {
                    tracing::info!(
                        file = %file.file_name,
                        bytes = file.bytes.len(),
                        "Dispatching upload (background)"
                    );

                    let outcome = settle("upload", runtime.upload.upload(&file)).await;
                    let event = Event::UploadCompleted {
                        file_name: file.file_name,
                        outcome,
                    };
                    if let Err(e) = runtime.dispatch(event) {
                        tracing::error!(error = %e, "Failed to record upload outcome");
                    }
                }))
            }
        }
    }

    fn publish(&self, event: ChatEvent) {
        // No subscribers is fine
        let _ = self.broadcast_tx.send(event);
    }

    fn lock_core(&self) -> MutexGuard<'_, ChatCore> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Await a collaborator call, turning a panic into an ordinary failure so the
/// completion event (and its flag release) is always delivered.
async fn settle<T>(
    what: &'static str,
    call: impl Future<Output = Result<T, CollaboratorError>>,
) -> Result<T, CollaboratorError> {
    AssertUnwindSafe(call).catch_unwind().await.unwrap_or_else(|_| {
        tracing::error!(call = what, "Collaborator call panicked");
        Err(CollaboratorError::transport(format!(
            "{what} request aborted unexpectedly"
        )))
    })
}
