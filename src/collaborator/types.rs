//! Wire types shared by the collaborator clients

use crate::session::SessionId;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Multipart field the upload collaborator reads the document from
pub const UPLOAD_FIELD: &str = "file";

/// Body of an ask request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AskRequest {
    pub session_id: SessionId,
    pub message: String,
}

/// A document picked by the user for ingestion
#[derive(Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

// Documents can be megabytes; print the size instead of the payload
impl fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// What the upload collaborator said on success
#[derive(Debug, Clone, PartialEq)]
pub struct UploadReceipt {
    pub status: u16,
    /// Parsed JSON body, when the collaborator sent one
    pub body: Option<Value>,
}

impl UploadReceipt {
    /// Number of indexed chunks, if the ingestion service reported it
    pub fn chunks(&self) -> Option<u64> {
        self.body.as_ref()?.get("chunks")?.as_u64()
    }

    /// User-facing confirmation text
    pub fn describe(&self, file_name: &str) -> String {
        match self.chunks() {
            Some(chunks) => format!("Uploaded {file_name} successfully ({chunks} chunks indexed)."),
            None => format!("Uploaded {file_name} successfully."),
        }
    }
}
