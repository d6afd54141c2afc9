//! In-process blob store.
//!
//! Simulates a resumable transfer: bytes move in fixed-size chunks with a
//! delay between them, each chunk reported as progress. The behavior of the
//! next uploads can be scripted to reproduce provider failures.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use templr_core::storage::{
    BlobStore, StorageError, StorageErrorCode, TransferEvent, UploadHandle, UploadMetadata,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use url::Url;

const DEFAULT_BASE_URL: &str = "https://firebasestorage.googleapis.com/v0/b/templr.appspot.com";
const DEFAULT_CHUNK_SIZE: usize = 256 * 1024;
const DEFAULT_CHUNK_DELAY: Duration = Duration::from_millis(20);

/// How the store treats the next uploads.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UploadBehavior {
    /// Transfer every chunk and store the object.
    #[default]
    Complete,
    /// Never report anything until canceled.
    Stall,
    /// Report progress, then fail halfway with the given code.
    FailAfterStart(StorageErrorCode),
    /// Fail before any progress with the given code.
    FailBeforeStart(StorageErrorCode),
}

/// An object that finished uploading.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Arc<[u8]>,
    pub content_type: String,
    token: String,
}

/// Blob store keeping objects in memory.
pub struct MemoryBlobStore {
    base_url: String,
    chunk_size: usize,
    chunk_delay: Duration,
    behavior: Mutex<UploadBehavior>,
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
    started: AtomicUsize,
    canceled: Arc<AtomicUsize>,
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_delay: DEFAULT_CHUNK_DELAY,
            behavior: Mutex::new(UploadBehavior::Complete),
            objects: Arc::new(RwLock::new(HashMap::new())),
            started: AtomicUsize::new(0),
            canceled: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_chunking(mut self, chunk_size: usize, chunk_delay: Duration) -> Self {
        self.chunk_size = chunk_size.max(1);
        self.chunk_delay = chunk_delay;
        self
    }

    pub fn set_behavior(&self, behavior: UploadBehavior) {
        *self.behavior.lock().unwrap_or_else(|p| p.into_inner()) = behavior;
    }

    /// Number of transfers ever started.
    pub fn upload_count(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    /// Number of transfers that stopped because their token was canceled.
    pub fn canceled_count(&self) -> usize {
        self.canceled.load(Ordering::SeqCst)
    }

    pub fn object(&self, path: &str) -> Option<StoredObject> {
        self.objects
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(path)
            .cloned()
    }

    /// Number of objects stored by completed transfers.
    pub fn object_count(&self) -> usize {
        self.objects.read().unwrap_or_else(|p| p.into_inner()).len()
    }

    fn current_behavior(&self) -> UploadBehavior {
        self.behavior.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    fn object_url(&self, path: &str, token: &str) -> Result<String, StorageError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            StorageError::new(
                StorageErrorCode::Other("storage/invalid-url".into()),
                format!("Invalid base URL '{}': {}", self.base_url, e),
            )
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                StorageError::new(
                    StorageErrorCode::Other("storage/invalid-url".into()),
                    format!("Base URL '{}' cannot carry a path", self.base_url),
                )
            })?
            .push("o")
            .push(path);
        url.query_pairs_mut()
            .append_pair("alt", "media")
            .append_pair("token", token);
        Ok(url.to_string())
    }
}

struct Transfer {
    path: String,
    bytes: Arc<[u8]>,
    content_type: String,
    behavior: UploadBehavior,
    chunk_size: usize,
    chunk_delay: Duration,
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
    canceled: Arc<AtomicUsize>,
}

impl Transfer {
    async fn run(self, events: mpsc::Sender<TransferEvent>, cancel: CancellationToken) {
        let total = self.bytes.len() as u64;

        match &self.behavior {
            UploadBehavior::FailBeforeStart(code) => {
                let _ = events
                    .send(TransferEvent::Failed(StorageError::new(
                        code.clone(),
                        "Upload rejected before start",
                    )))
                    .await;
                return;
            }
            UploadBehavior::Stall => {
                cancel.cancelled().await;
                self.canceled.fetch_add(1, Ordering::SeqCst);
                let _ = events.send(canceled()).await;
                return;
            }
            UploadBehavior::Complete | UploadBehavior::FailAfterStart(_) => {}
        }

        if events
            .send(TransferEvent::Progress {
                bytes_transferred: 0,
                total_bytes: total,
            })
            .await
            .is_err()
        {
            return;
        }

        let mut sent = 0u64;
        while sent < total {
            tokio::select! {
                _ = cancel.cancelled() => {
                    self.canceled.fetch_add(1, Ordering::SeqCst);
                    let _ = events.send(canceled()).await;
                    return;
                }
                _ = tokio::time::sleep(self.chunk_delay) => {}
            }

            sent = (sent + self.chunk_size as u64).min(total);
            let progress = TransferEvent::Progress {
                bytes_transferred: sent,
                total_bytes: total,
            };
            if events.send(progress).await.is_err() {
                return;
            }

            if let UploadBehavior::FailAfterStart(code) = &self.behavior {
                if sent * 2 >= total {
                    let _ = events
                        .send(TransferEvent::Failed(StorageError::new(
                            code.clone(),
                            "Transfer interrupted",
                        )))
                        .await;
                    return;
                }
            }
        }

        if cancel.is_cancelled() {
            self.canceled.fetch_add(1, Ordering::SeqCst);
            let _ = events.send(canceled()).await;
            return;
        }

        let object = StoredObject {
            bytes: self.bytes.clone(),
            content_type: self.content_type.clone(),
            token: uuid::Uuid::new_v4().to_string(),
        };
        self.objects
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .insert(self.path.clone(), object);

        tracing::debug!(
            "[MemoryBlobStore] Stored '{}' ({} bytes)",
            self.path,
            total
        );
        let _ = events.send(TransferEvent::Completed).await;
    }
}

fn canceled() -> TransferEvent {
    TransferEvent::Failed(StorageError::new(
        StorageErrorCode::Canceled,
        "User canceled the upload",
    ))
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn start_upload(
        &self,
        path: &str,
        bytes: Arc<[u8]>,
        metadata: UploadMetadata,
    ) -> UploadHandle {
        self.started.fetch_add(1, Ordering::SeqCst);

        let (tx, rx) = mpsc::channel(32);
        let cancel = CancellationToken::new();
        let transfer = Transfer {
            path: path.to_string(),
            bytes,
            content_type: metadata.content_type,
            behavior: self.current_behavior(),
            chunk_size: self.chunk_size,
            chunk_delay: self.chunk_delay,
            objects: self.objects.clone(),
            canceled: self.canceled.clone(),
        };
        tokio::spawn(transfer.run(tx, cancel.clone()));

        UploadHandle::new(rx, cancel)
    }

    async fn download_url(&self, path: &str) -> Result<String, StorageError> {
        let token = self
            .object(path)
            .map(|object| object.token)
            .ok_or_else(|| {
                StorageError::new(
                    StorageErrorCode::Other("storage/object-not-found".into()),
                    format!("No object exists at '{}'", path),
                )
            })?;
        self.object_url(path, &token)
    }
}
