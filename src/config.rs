//! Relay configuration from the environment

use crate::state_machine::{ChatContext, SendPolicy, StaleReplyPolicy};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_ASK_URL: &str = "http://localhost:8000/ask";
pub const DEFAULT_UPLOAD_URL: &str = "http://localhost:8004/upload";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_UPLOAD_MB: usize = 25;

/// Settings read once at start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub ask_url: String,
    pub upload_url: String,
    pub port: u16,
    pub send_policy: SendPolicy,
    pub stale_replies: StaleReplyPolicy,
    /// `None` waits on collaborators indefinitely
    pub request_timeout: Option<Duration>,
    pub max_upload_bytes: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            ask_url: DEFAULT_ASK_URL.to_string(),
            upload_url: DEFAULT_UPLOAD_URL.to_string(),
            port: DEFAULT_PORT,
            send_policy: SendPolicy::default(),
            stale_replies: StaleReplyPolicy::default(),
            request_timeout: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
        }
    }
}

impl RelayConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unparseable values keep their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let timeout_secs: Option<u64> = parsed(&lookup, "CHAT_REQUEST_TIMEOUT_SECS");
        let max_upload_mb = match parsed::<usize>(&lookup, "CHAT_MAX_UPLOAD_MB") {
            Some(0) => {
                tracing::warn!(key = "CHAT_MAX_UPLOAD_MB", "Ignoring zero upload limit");
                DEFAULT_MAX_UPLOAD_MB
            }
            Some(mb) => mb,
            None => DEFAULT_MAX_UPLOAD_MB,
        };

        Self {
            ask_url: lookup("CHAT_ASK_URL").unwrap_or(defaults.ask_url),
            upload_url: lookup("CHAT_UPLOAD_URL").unwrap_or(defaults.upload_url),
            port: parsed(&lookup, "CHAT_RELAY_PORT").unwrap_or(defaults.port),
            send_policy: parsed(&lookup, "CHAT_SEND_POLICY").unwrap_or(defaults.send_policy),
            stale_replies: parsed(&lookup, "CHAT_STALE_REPLIES")
                .unwrap_or(defaults.stale_replies),
            request_timeout: timeout_secs.filter(|s| *s > 0).map(Duration::from_secs),
            max_upload_bytes: max_upload_mb.saturating_mul(1024 * 1024),
        }
    }

    pub fn chat_context(&self) -> ChatContext {
        ChatContext {
            send_policy: self.send_policy,
            stale_replies: self.stale_replies,
        }
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, value = %raw, error = %e, "Ignoring invalid setting");
            None
        }
    }
}
