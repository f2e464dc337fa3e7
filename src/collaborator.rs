//! Collaborator services
//!
//! The ask and upload endpoints are opaque HTTP services. The runtime only
//! sees them through the traits below so tests can swap in mocks.

mod ask;
mod error;
mod types;
mod upload;

pub use ask::HttpAskService;
pub use error::{CollaboratorError, CollaboratorErrorKind};
pub use types::*;
pub use upload::HttpUploadService;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Question-answering collaborator
#[async_trait]
pub trait AskService: Send + Sync {
    /// Send one message and return the response payload untouched
    async fn ask(&self, request: &AskRequest) -> Result<Value, CollaboratorError>;

    fn endpoint(&self) -> &str;
}

/// Document ingestion collaborator
#[async_trait]
pub trait UploadService: Send + Sync {
    async fn upload(&self, file: &UploadFile) -> Result<UploadReceipt, CollaboratorError>;

    fn endpoint(&self) -> &str;
}

// ============================================================================
// Arc implementations for shared services
// ============================================================================

#[async_trait]
impl<T: AskService + ?Sized> AskService for Arc<T> {
    async fn ask(&self, request: &AskRequest) -> Result<Value, CollaboratorError> {
        (**self).ask(request).await
    }

    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }
}

#[async_trait]
impl<T: UploadService + ?Sized> UploadService for Arc<T> {
    async fn upload(&self, file: &UploadFile) -> Result<UploadReceipt, CollaboratorError> {
        (**self).upload(file).await
    }

    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }
}

/// Shared HTTP client for both collaborators.
///
/// No timeout unless one is configured: an unresponsive collaborator keeps
/// its in-flight flag raised.
pub fn build_client(timeout: Option<Duration>) -> reqwest::Result<Client> {
    let mut builder = Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build()
}

/// Logging wrapper for ask services
pub struct LoggingAskService {
    inner: Arc<dyn AskService>,
}

impl LoggingAskService {
    pub fn new(inner: Arc<dyn AskService>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl AskService for LoggingAskService {
    async fn ask(&self, request: &AskRequest) -> Result<Value, CollaboratorError> {
        let start = Instant::now();
        let result = self.inner.ask(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(_) => {
                tracing::info!(
                    endpoint = %self.inner.endpoint(),
                    session_id = %request.session_id,
                    duration_ms = %duration.as_millis(),
                    "Ask request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    endpoint = %self.inner.endpoint(),
                    session_id = %request.session_id,
                    duration_ms = %duration.as_millis(),
                    kind = ?e.kind,
                    error = %e.message,
                    "Ask request failed"
                );
            }
        }

        result
    }

    fn endpoint(&self) -> &str {
        self.inner.endpoint()
    }
}

/// Logging wrapper for upload services
pub struct LoggingUploadService {
    inner: Arc<dyn UploadService>,
}

impl LoggingUploadService {
    pub fn new(inner: Arc<dyn UploadService>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl UploadService for LoggingUploadService {
    async fn upload(&self, file: &UploadFile) -> Result<UploadReceipt, CollaboratorError> {
        let start = Instant::now();
        let result = self.inner.upload(file).await;
        let duration = start.elapsed();

        match &result {
            Ok(receipt) => {
                tracing::info!(
                    endpoint = %self.inner.endpoint(),
                    file = %file.file_name,
                    bytes = file.bytes.len(),
                    status = receipt.status,
                    duration_ms = %duration.as_millis(),
                    "Upload completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    endpoint = %self.inner.endpoint(),
                    file = %file.file_name,
                    status = ?e.kind.status(),
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    "Upload failed"
                );
            }
        }

        result
    }

    fn endpoint(&self) -> &str {
        self.inner.endpoint()
    }
}
