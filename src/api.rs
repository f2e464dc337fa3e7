//! HTTP API for the chat relay
//!
//! Exposes the chat runtime to a browser: snapshot reads, user intents and
//! a live event stream.

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::runtime::RelayRuntime;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<RelayRuntime>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(runtime: Arc<RelayRuntime>, max_upload_bytes: usize) -> Self {
        Self {
            runtime,
            max_upload_bytes,
        }
    }
}
