//! Remote blob store contract.
//!
//! Uploads are resumable transfers that report their state on a channel. The
//! caller owns the receiving end and a cancellation token; canceling asks the
//! transport to stop, after which it reports a `Canceled` failure.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Provider error codes the client distinguishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageErrorCode {
    /// `storage/unauthorized`
    Unauthorized,
    /// `storage/canceled`
    Canceled,
    /// `storage/retry-limit-exceeded`
    RetryLimitExceeded,
    /// Any other provider code, kept verbatim.
    Other(String),
}

impl StorageErrorCode {
    pub fn as_str(&self) -> &str {
        match self {
            StorageErrorCode::Unauthorized => "storage/unauthorized",
            StorageErrorCode::Canceled => "storage/canceled",
            StorageErrorCode::RetryLimitExceeded => "storage/retry-limit-exceeded",
            StorageErrorCode::Other(code) => code,
        }
    }

    /// Parses a provider code string.
    pub fn parse(code: &str) -> Self {
        match code {
            "storage/unauthorized" => StorageErrorCode::Unauthorized,
            "storage/canceled" => StorageErrorCode::Canceled,
            "storage/retry-limit-exceeded" => StorageErrorCode::RetryLimitExceeded,
            other => StorageErrorCode::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for StorageErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported by the blob store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct StorageError {
    pub code: StorageErrorCode,
    pub message: String,
}

impl StorageError {
    pub fn new(code: StorageErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Metadata attached to an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadMetadata {
    pub content_type: String,
}

/// State signal emitted by a running transfer.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferEvent {
    Progress {
        bytes_transferred: u64,
        total_bytes: u64,
    },
    Failed(StorageError),
    Completed,
}

/// Client side of one resumable transfer.
pub struct UploadHandle {
    pub events: mpsc::Receiver<TransferEvent>,
    pub cancel: CancellationToken,
}

impl UploadHandle {
    pub fn new(events: mpsc::Receiver<TransferEvent>, cancel: CancellationToken) -> Self {
        Self { events, cancel }
    }
}

/// Hosted object storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Starts a resumable upload of `bytes` to `path`.
    ///
    /// Returns immediately; the transfer runs in the background and reports
    /// through the handle. A failure to even begin is reported as the first
    /// event, not as an error here.
    fn start_upload(&self, path: &str, bytes: Arc<[u8]>, metadata: UploadMetadata)
    -> UploadHandle;

    /// Resolves the durable, publicly resolvable URL of an uploaded object.
    async fn download_url(&self, path: &str) -> Result<String, StorageError>;
}
