//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{ErrorResponse, NewChatResponse, QueuedResponse, SendMessageRequest};
use super::AppState;
use crate::collaborator::{UploadFile, UPLOAD_FIELD};
use crate::runtime::ChatSnapshot;
use crate::state_machine::TransitionError;
use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let upload_limit = state.max_upload_bytes;

    Router::new()
        // Read model
        .route("/api/chat", get(get_chat))
        // Live updates
        .route("/api/chat/stream", get(stream_chat))
        // User intents
        .route("/api/chat/messages", post(send_message))
        .route(
            "/api/chat/upload",
            post(upload_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/chat/new", post(new_chat))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Read Model
// ============================================================

async fn get_chat(State(state): State<AppState>) -> Json<ChatSnapshot> {
    Json(state.runtime.snapshot())
}

async fn stream_chat(State(state): State<AppState>) -> impl IntoResponse {
    let (snapshot, rx) = state.runtime.watch();
    let runtime = state.runtime;
    sse_stream(snapshot, rx, move || runtime.watch())
}

// ============================================================
// User Intents
// ============================================================

async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<QueuedResponse>, AppError> {
    // The reply lands in the transcript later; clients follow the stream
    state.runtime.send_message(req.text)?;
    Ok(Json(QueuedResponse { queued: true }))
}

async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<QueuedResponse>, AppError> {
    let file = read_upload(&mut multipart).await?;
    state.runtime.upload_file(file)?;
    Ok(Json(QueuedResponse { queued: true }))
}

async fn new_chat(State(state): State<AppState>) -> Json<NewChatResponse> {
    Json(NewChatResponse {
        session_id: state.runtime.new_chat(),
    })
}

/// Pull the first `file` field out of the form.
///
/// A missing field or an empty filename (what browsers send when nothing
/// was chosen) both mean no file. Any content type is forwarded; the
/// ingestion service decides what it can index.
async fn read_upload(multipart: &mut Multipart) -> Result<Option<UploadFile>, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;

        if file_name.is_empty() {
            return Ok(None);
        }

        let mut file = UploadFile::new(file_name, bytes.to_vec());
        if let Some(content_type) = content_type {
            file = file.with_content_type(content_type);
        }
        return Ok(Some(file));
    }

    Ok(None)
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("chat_relay ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

enum AppError {
    BadRequest(String),
    Rejected(StatusCode, String),
}

impl From<TransitionError> for AppError {
    fn from(e: TransitionError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        AppError::Rejected(e.status(), e.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Rejected(status, msg) => (status, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
