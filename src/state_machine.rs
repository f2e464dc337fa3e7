//! Core chat state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions:
//! the runtime feeds in events, `transition` returns the next state plus
//! the effects the runtime must carry out.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::{Effect, Notice, NoticeLevel};
pub use event::Event;
pub use state::{ChatContext, ChatState, SendPolicy, StaleReplyPolicy, StateView};
pub use transition::{transition, TransitionError};
