//! HTTP client for the ask collaborator

use super::{AskRequest, AskService, CollaboratorError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

/// Posts `{session_id, message}` as JSON and returns whatever JSON comes back.
///
/// The status code is not inspected: a 4xx/5xx with a JSON body is
/// still an answer to show. Only transport and decode failures are errors.
pub struct HttpAskService {
    client: Client,
    endpoint: String,
}

impl HttpAskService {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl AskService for HttpAskService {
    async fn ask(&self, request: &AskRequest) -> Result<Value, CollaboratorError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| CollaboratorError::from_reqwest(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CollaboratorError::transport(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            tracing::debug!(status = %status, "Ask collaborator returned non-success status");
        }

        serde_json::from_str(&body)
            .map_err(|e| CollaboratorError::decode(format!("Invalid JSON in response: {e}")))
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
