//! Server-Sent Events support

use crate::runtime::{ChatEvent, ChatSnapshot};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Convert broadcast stream to SSE stream.
///
/// A subscriber that falls behind the broadcast buffer gets a fresh `init`
/// from `resync` in place of the events it missed.
pub fn sse_stream<F>(
    init: ChatSnapshot,
    broadcast_rx: broadcast::Receiver<ChatEvent>,
    resync: F,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    F: Fn() -> (ChatSnapshot, broadcast::Receiver<ChatEvent>) + Send + 'static,
{
    let events = chat_feed(init, broadcast_rx, resync).map(|(event_type, data)| {
        Ok::<_, Infallible>(Event::default().event(event_type).data(data.to_string()))
    });

    Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

struct Feed<F> {
    pending_init: Option<ChatSnapshot>,
    events: BroadcastStream<ChatEvent>,
    resync: F,
}

/// Init snapshot, then live events, restarting from a new snapshot on lag
fn chat_feed<F>(
    init: ChatSnapshot,
    broadcast_rx: broadcast::Receiver<ChatEvent>,
    resync: F,
) -> impl Stream<Item = (&'static str, Value)>
where
    F: Fn() -> (ChatSnapshot, broadcast::Receiver<ChatEvent>) + Send + 'static,
{
    let feed = Feed {
        pending_init: Some(init),
        events: BroadcastStream::new(broadcast_rx),
        resync,
    };

    futures::stream::unfold(feed, |mut feed| async move {
        if let Some(snapshot) = feed.pending_init.take() {
            return Some((init_payload(&snapshot), feed));
        }

        match feed.events.next().await? {
            Ok(event) => Some((event_payload(event), feed)),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "SSE subscriber lagged, resending snapshot");
                let (snapshot, rx) = (feed.resync)();
                feed.events = BroadcastStream::new(rx);
                Some((init_payload(&snapshot), feed))
            }
        }
    })
}

fn init_payload(snapshot: &ChatSnapshot) -> (&'static str, Value) {
    (
        "init",
        json!({
            "type": "init",
            "snapshot": snapshot
        }),
    )
}

fn event_payload(event: ChatEvent) -> (&'static str, Value) {
    match event {
        ChatEvent::Entry { entry } => (
            "entry",
            json!({
                "type": "entry",
                "entry": entry
            }),
        ),
        ChatEvent::StateChange { state } => (
            "state_change",
            json!({
                "type": "state_change",
                "state": state
            }),
        ),
        ChatEvent::InputCleared => (
            "input_cleared",
            json!({
                "type": "input_cleared"
            }),
        ),
        ChatEvent::SessionReset { session_id } => (
            "session_reset",
            json!({
                "type": "session_reset",
                "session_id": session_id
            }),
        ),
        ChatEvent::Notice { notice } => (
            "notice",
            json!({
                "type": "notice",
                "notice": notice
            }),
        ),
    }
}
