//! Local file selected for upload.

use crate::error::Result;
use std::path::Path;
use std::sync::Arc;

/// Content type used when a file declares none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// A file picked by the user, held in memory for the transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// Original file name
    pub name: String,
    /// Declared MIME type, if any
    pub content_type: Option<String>,
    pub bytes: Arc<[u8]>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.filter(|t| !t.trim().is_empty()),
            bytes: bytes.into(),
        }
    }

    /// Reads a file from disk, guessing its content type from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content_type = mime_guess::from_path(path)
            .first()
            .map(|mime| mime.essence_str().to_string());
        Ok(Self::new(name, content_type, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// The declared content type, or [`DEFAULT_CONTENT_TYPE`].
    pub fn content_type_or_default(&self) -> &str {
        self.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE)
    }

    pub fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|t| t.starts_with("image/"))
    }

    /// Extension after the last dot, e.g. `zip` for `kit.v2.zip`.
    pub fn extension(&self) -> Option<&str> {
        self.name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_defaults_to_octet_stream() {
        let file = UploadFile::new("kit.zip", None, vec![1, 2, 3]);
        assert_eq!(file.content_type_or_default(), DEFAULT_CONTENT_TYPE);
        let file = UploadFile::new("kit.zip", Some(" ".into()), vec![1]);
        assert_eq!(file.content_type_or_default(), DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn test_extension_and_image_detection() {
        let file = UploadFile::new("cover.final.png", Some("image/png".into()), vec![0]);
        assert_eq!(file.extension(), Some("png"));
        assert!(file.is_image());

        let file = UploadFile::new("README", None, vec![0]);
        assert_eq!(file.extension(), None);
        assert!(!file.is_image());
    }

    #[tokio::test]
    async fn test_from_path_guesses_mime() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("design.fig.zip");
        tokio::fs::write(&path, b"PK\x03\x04").await.unwrap();

        let file = UploadFile::from_path(&path).await.unwrap();
        assert_eq!(file.name, "design.fig.zip");
        assert_eq!(file.size(), 4);
        assert_eq!(file.content_type.as_deref(), Some("application/zip"));
    }
}
