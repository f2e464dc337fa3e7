//! Transcript store
//!
//! Ordered, append-only record of the exchanges in the active session. The
//! only way to remove entries is `clear`, which the runtime calls together
//! with a session reset.

use serde::{Deserialize, Serialize};

/// Who authored an exchange entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Bot,
}

/// One turn of the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeEntry {
    pub role: Role,
    pub content: String,
}

impl ExchangeEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn bot(content: impl Into<String>) -> Self {
        Self {
            role: Role::Bot,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<ExchangeEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: ExchangeEntry) {
        self.entries.push(entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Copy of the current sequence, safe to render while appends continue
    pub fn snapshot(&self) -> Vec<ExchangeEntry> {
        self.entries().to_vec()
    }

    pub fn entries(&self) -> &[ExchangeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
