//! Asset uploads with progress, a start watchdog and classified failures.

use std::sync::Arc;
use std::time::Duration;
use templr_core::storage::{
    BlobStore, StorageError, StorageErrorCode, TransferEvent, UploadFile, UploadHandle,
    UploadMetadata,
};
use templr_core::{Result, TemplrError, TimeoutKind};
use tokio_util::sync::CancellationToken;

/// Maps a provider failure onto the client error taxonomy.
pub fn classify_storage_error(error: StorageError) -> TemplrError {
    match error.code {
        StorageErrorCode::Unauthorized => TemplrError::Unauthorized(error.message),
        StorageErrorCode::Canceled => TemplrError::Canceled,
        StorageErrorCode::RetryLimitExceeded => TemplrError::RetryExhausted(error.message),
        StorageErrorCode::Other(code) => TemplrError::unknown(code, error.message),
    }
}

fn percent(bytes_transferred: u64, total_bytes: u64) -> f64 {
    if total_bytes == 0 {
        return 100.0;
    }
    (bytes_transferred as f64 / total_bytes as f64 * 100.0).clamp(0.0, 100.0)
}

/// Transfers local files to the blob store.
pub struct AssetUploader {
    blobs: Arc<dyn BlobStore>,
    start_timeout: Duration,
}

impl AssetUploader {
    /// # Arguments
    ///
    /// * `blobs` - Blob store receiving the transfers
    /// * `start_timeout` - How long a transfer may go without its first
    ///   progress event before it is canceled
    pub fn new(blobs: Arc<dyn BlobStore>, start_timeout: Duration) -> Self {
        Self {
            blobs,
            start_timeout,
        }
    }

    /// Uploads `file` to `destination` and resolves its download URL.
    ///
    /// See [`upload_with_cancel`](Self::upload_with_cancel).
    pub async fn upload<P>(&self, file: &UploadFile, destination: &str, on_progress: P) -> Result<String>
    where
        P: FnMut(f64) + Send,
    {
        self.upload_with_cancel(file, destination, on_progress, CancellationToken::new())
            .await
    }

    /// Uploads `file` to `destination`, cancelable through `cancel`.
    ///
    /// `on_progress` receives percentages in `[0, 100]` that never decrease.
    /// Nothing is reported after the call resolves.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for an empty file, before the blob store is touched
    /// - `Timeout` with [`TimeoutKind::NeverStarted`] when no progress arrives
    ///   within the start window; the transfer is canceled
    /// - `Canceled` when `cancel` fires or the provider reports cancellation
    /// - `Unauthorized`, `RetryExhausted` or `Unknown` for provider failures
    ///
    /// Dropping the returned future before it resolves cancels the transfer.
    pub async fn upload_with_cancel<P>(
        &self,
        file: &UploadFile,
        destination: &str,
        mut on_progress: P,
        cancel: CancellationToken,
    ) -> Result<String>
    where
        P: FnMut(f64) + Send,
    {
        if file.size() == 0 {
            return Err(TemplrError::invalid_input(format!(
                "'{}' is empty; choose a file with content",
                file.name
            )));
        }

        let metadata = UploadMetadata {
            content_type: file.content_type_or_default().to_string(),
        };
        tracing::info!(
            "[AssetUploader] Uploading '{}' ({} bytes, {}) to {}",
            file.name,
            file.size(),
            metadata.content_type,
            destination
        );
        let handle = self
            .blobs
            .start_upload(destination, file.bytes.clone(), metadata);

        // Dropping this future mid-transfer (an outer deadline) cancels the transfer.
        let cancel_on_drop = handle.cancel.clone().drop_guard();
        let result = self
            .drive(handle, destination, &mut on_progress, &cancel)
            .await;
        cancel_on_drop.disarm();
        result
    }

    async fn drive<P>(
        &self,
        mut handle: UploadHandle,
        destination: &str,
        on_progress: &mut P,
        cancel: &CancellationToken,
    ) -> Result<String>
    where
        P: FnMut(f64) + Send,
    {
        let watchdog = tokio::time::sleep(self.start_timeout);
        tokio::pin!(watchdog);
        let mut started = false;
        let mut reported = 0.0_f64;

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    handle.cancel.cancel();
                    tracing::info!("[AssetUploader] Upload to {} canceled by caller", destination);
                    return Err(TemplrError::Canceled);
                }

                _ = &mut watchdog, if !started => {
                    handle.cancel.cancel();
                    tracing::warn!(
                        "[AssetUploader] No progress for {:?} uploading to {}; check storage CORS and bucket configuration",
                        self.start_timeout,
                        destination
                    );
                    return Err(TemplrError::timeout(
                        TimeoutKind::NeverStarted,
                        self.start_timeout,
                        format!("Upload to {} never started", destination),
                    ));
                }

                event = handle.events.recv() => match event {
                    Some(TransferEvent::Progress { bytes_transferred, total_bytes }) => {
                        started = true;
                        let pct = percent(bytes_transferred, total_bytes);
                        if pct >= reported {
                            reported = pct;
                            on_progress(pct);
                        }
                    }
                    Some(TransferEvent::Failed(error)) => {
                        tracing::warn!("[AssetUploader] Upload to {} failed: {}", destination, error);
                        return Err(classify_storage_error(error));
                    }
                    Some(TransferEvent::Completed) => {
                        let url = self
                            .blobs
                            .download_url(destination)
                            .await
                            .map_err(classify_storage_error)?;
                        tracing::info!("[AssetUploader] Upload to {} complete", destination);
                        return Ok(url);
                    }
                    None => {
                        return Err(TemplrError::unknown(
                            "storage/unknown",
                            format!("Transfer to {} ended without a result", destination),
                        ));
                    }
                }
            }
        }
    }
}
