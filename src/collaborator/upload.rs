//! HTTP client for the upload (document ingestion) collaborator

use super::{CollaboratorError, UploadFile, UploadReceipt, UploadService, UPLOAD_FIELD};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde_json::Value;

/// Sends the document as a multipart form under the `file` field.
pub struct HttpUploadService {
    client: Client,
    endpoint: String,
}

impl HttpUploadService {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    fn build_form(file: &UploadFile) -> Result<Form, CollaboratorError> {
        let mut part = Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
        if let Some(content_type) = &file.content_type {
            part = part.mime_str(content_type).map_err(|e| {
                CollaboratorError::invalid_input(format!(
                    "Invalid content type {content_type:?}: {e}"
                ))
            })?;
        }
        Ok(Form::new().part(UPLOAD_FIELD, part))
    }
}

/// Best-effort message for a failed upload.
///
/// Prefers a JSON `message` field, then a string `detail` field (the shape
/// FastAPI error responses use), then the status reason phrase.
pub(crate) fn failure_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|parsed| {
            ["message", "detail"]
                .iter()
                .find_map(|key| parsed.get(*key).and_then(Value::as_str).map(str::to_string))
        })
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map_or_else(|| status.as_str().to_string(), str::to_string)
        })
}

#[async_trait]
impl UploadService for HttpUploadService {
    async fn upload(&self, file: &UploadFile) -> Result<UploadReceipt, CollaboratorError> {
        let form = Self::build_form(file)?;

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| CollaboratorError::from_reqwest(&e))?;

        let status = response.status();
        // An unreadable body only costs us the detail, not the outcome
        let body = response.text().await.unwrap_or_default();

        if status.is_success() {
            Ok(UploadReceipt {
                status: status.as_u16(),
                body: serde_json::from_str(&body).ok(),
            })
        } else {
            Err(CollaboratorError::server(
                status.as_u16(),
                failure_message(status, &body),
            ))
        }
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
