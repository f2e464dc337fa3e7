//! Chat relay - browser chat client core
//!
//! Keeps one chat session's identity and transcript, relays messages to a
//! question-answering service and documents to an ingestion service, and
//! streams every change to the browser.

mod api;
mod collaborator;
mod config;
mod runtime;
mod session;
mod state_machine;
mod transcript;

use api::{create_router, AppState};
use config::RelayConfig;
use std::net::SocketAddr;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chat_relay=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = RelayConfig::from_env();
    tracing::info!(
        ask_url = %config.ask_url,
        upload_url = %config.upload_url,
        send_policy = ?config.send_policy,
        stale_replies = ?config.stale_replies,
        timeout_secs = ?config.request_timeout.map(|t| t.as_secs()),
        "Relay configured"
    );

    let runtime = runtime::build_relay_runtime(&config)?;
    tracing::info!(session_id = %runtime.session_id(), "Chat session started");

    let state = AppState::new(runtime, config.max_upload_bytes);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Chat relay listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
