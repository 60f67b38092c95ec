//! Staged-file queue for bulk claim uploads
//!
//! Files are staged by name (exact, case-sensitive) and only read from disk
//! at preview or commit time. A commit sends the whole queue as one
//! multipart request; success clears the queue as a unit, failure leaves it
//! untouched. Either way exactly one entry lands in the transcript.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::client::{ChatClient, ClientError};
use crate::conversation::Conversation;

/// Transcript text used when the backend reports no message of its own.
pub const UPLOAD_SUCCESS_NOTICE: &str = "Files uploaded successfully.";
/// Transcript text substituted when a commit cannot complete.
pub const UPLOAD_FAILURE_NOTICE: &str = "File upload failed. Please try again.";

/// A file selected for upload but not yet committed. `path` is the content
/// handle; bytes stay on disk until they are needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub name: String,
    pub path: PathBuf,
}

impl StagedFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { name, path }
    }
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Upload queue is empty")]
    EmptyQueue,

    #[error("Failed to read staged file: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Client(#[from] ClientError),
}

#[derive(Debug, Default)]
pub struct UploadQueue {
    files: Vec<StagedFile>,
}

impl UploadQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn files(&self) -> &[StagedFile] {
        &self.files
    }

    pub fn get(&self, name: &str) -> Option<&StagedFile> {
        self.files.iter().find(|f| f.name == name)
    }

    /// Stage candidates in input order, silently skipping any whose name is
    /// already queued. Returns how many were actually added.
    pub fn add_files(&mut self, candidates: impl IntoIterator<Item = StagedFile>) -> usize {
        let mut added = 0;
        for file in candidates {
            if self.files.iter().any(|f| f.name == file.name) {
                tracing::debug!(name = %file.name, "skipping duplicate staged file");
                continue;
            }
            self.files.push(file);
            added += 1;
        }
        added
    }

    /// Remove the entry with exactly this name. Returns false when absent.
    pub fn remove_file(&mut self, name: &str) -> bool {
        let before = self.files.len();
        self.files.retain(|f| f.name != name);
        self.files.len() != before
    }

    /// Send the whole queue as one multipart request.
    ///
    /// On success the queue is cleared as a unit and the backend's
    /// confirmation (or [`UPLOAD_SUCCESS_NOTICE`] when it sends none) is
    /// appended to the transcript. On any failure the queue is left exactly
    /// as it was and [`UPLOAD_FAILURE_NOTICE`] is appended instead. At most
    /// one commit can be in flight: the `&mut self` borrow lasts for the
    /// whole call.
    pub async fn commit(
        &mut self,
        client: &ChatClient,
        conversation: &mut Conversation,
    ) -> Result<String, UploadError> {
        if self.files.is_empty() {
            return Err(UploadError::EmptyQueue);
        }

        tracing::info!(files = self.files.len(), "committing staged claim files");

        match self.send_all(client).await {
            Ok(message) => {
                self.files.clear();
                conversation.push_assistant(&message);
                Ok(message)
            }
            Err(err) => {
                tracing::warn!(%err, "claim upload failed");
                conversation.push_assistant(UPLOAD_FAILURE_NOTICE);
                Err(err)
            }
        }
    }

    async fn send_all(&self, client: &ChatClient) -> Result<String, UploadError> {
        let mut parts = Vec::with_capacity(self.files.len());
        for file in &self.files {
            let bytes = tokio::fs::read(&file.path).await?;
            parts.push((file.name.clone(), bytes));
        }

        let receipt = client.upload_claims(parts).await?;
        Ok(receipt
            .message
            .unwrap_or_else(|| UPLOAD_SUCCESS_NOTICE.to_string()))
    }
}

/// True for the `.csv` files the backend accepts (the file picker's
/// `accept=".csv"` filter, applied client-side).
pub fn is_csv(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some("csv")
}
