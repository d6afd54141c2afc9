//! Atomically written TOML documents.
//!
//! Writes go to a hidden temp file in the same directory, are fsynced, then
//! renamed over the target. Read-modify-write cycles hold an exclusive lock
//! file so two processes sharing a profile cannot interleave.

use serde::{Serialize, de::DeserializeOwned};
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use templr_core::TemplrError;

/// Errors that can occur while reading or writing a TOML document.
#[derive(Debug)]
pub enum TomlDocumentError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Serialize(toml::ser::Error),
    Lock(String),
}

impl std::fmt::Display for TomlDocumentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TomlDocumentError::Io(e) => write!(f, "I/O error: {}", e),
            TomlDocumentError::Parse(e) => write!(f, "TOML parse error: {}", e),
            TomlDocumentError::Serialize(e) => write!(f, "TOML serialization error: {}", e),
            TomlDocumentError::Lock(e) => write!(f, "Lock error: {}", e),
        }
    }
}

impl std::error::Error for TomlDocumentError {}

impl From<std::io::Error> for TomlDocumentError {
    fn from(e: std::io::Error) -> Self {
        TomlDocumentError::Io(e)
    }
}

impl From<toml::de::Error> for TomlDocumentError {
    fn from(e: toml::de::Error) -> Self {
        TomlDocumentError::Parse(e)
    }
}

impl From<toml::ser::Error> for TomlDocumentError {
    fn from(e: toml::ser::Error) -> Self {
        TomlDocumentError::Serialize(e)
    }
}

impl From<TomlDocumentError> for TemplrError {
    fn from(err: TomlDocumentError) -> Self {
        match err {
            TomlDocumentError::Io(e) => TemplrError::from(e),
            TomlDocumentError::Parse(e) => TemplrError::from(e),
            TomlDocumentError::Serialize(e) => TemplrError::from(e),
            TomlDocumentError::Lock(message) => TemplrError::io(message),
        }
    }
}

/// A typed TOML file on disk.
pub struct TomlDocument<T> {
    path: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T> TomlDocument<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _phantom: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the document. A missing or blank file reads as `None`.
    pub fn load(&self) -> Result<Option<T>, TomlDocumentError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(toml::from_str(&content)?))
    }

    /// Replaces the document atomically.
    pub fn save(&self, data: &T) -> Result<(), TomlDocumentError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let text = toml::to_string_pretty(data)?;

        let tmp_path = self.temp_path()?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(text.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Loads (or starts from `default_value`), applies `f`, saves, all under
    /// an exclusive lock.
    pub fn update<F, R>(&self, default_value: T, f: F) -> Result<R, TomlDocumentError>
    where
        F: FnOnce(&mut T) -> R,
    {
        let _lock = LockFile::acquire(&self.path)?;

        let mut data = self.load()?.unwrap_or(default_value);
        let result = f(&mut data);
        self.save(&data)?;

        Ok(result)
    }

    fn temp_path(&self) -> Result<PathBuf, TomlDocumentError> {
        let invalid = |what: &str| {
            TomlDocumentError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Path has no {}", what),
            ))
        };
        let parent = self.path.parent().ok_or_else(|| invalid("parent directory"))?;
        let file_name = self.path.file_name().ok_or_else(|| invalid("file name"))?;
        Ok(parent.join(format!(".{}.tmp", file_name.to_string_lossy())))
    }
}

/// Exclusive lock held through a sibling `.lock` file; released on drop.
struct LockFile {
    _file: File,
    path: PathBuf,
}

impl LockFile {
    fn acquire(target: &Path) -> Result<Self, TomlDocumentError> {
        let path = target.with_extension("lock");
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive()
                .map_err(|e| TomlDocumentError::Lock(format!("Failed to acquire lock: {}", e)))?;
        }

        Ok(LockFile { _file: file, path })
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
    struct Entries {
        values: BTreeMap<String, String>,
    }

    #[test]
    fn test_missing_and_blank_files_load_as_none() {
        let dir = TempDir::new().unwrap();
        let doc = TomlDocument::<Entries>::new(dir.path().join("missing.toml"));
        assert!(doc.load().unwrap().is_none());

        let blank = dir.path().join("blank.toml");
        fs::write(&blank, "  \n").unwrap();
        assert!(TomlDocument::<Entries>::new(blank).load().unwrap().is_none());
    }

    #[test]
    fn test_update_creates_then_modifies() {
        let dir = TempDir::new().unwrap();
        let doc = TomlDocument::<Entries>::new(dir.path().join("nested/kv.toml"));

        doc.update(Entries::default(), |e| {
            e.values.insert("a".into(), "1".into());
        })
        .unwrap();
        let count = doc
            .update(Entries::default(), |e| {
                e.values.insert("b".into(), "2".into());
                e.values.len()
            })
            .unwrap();

        assert_eq!(count, 2);
        let loaded = doc.load().unwrap().unwrap();
        assert_eq!(loaded.values["a"], "1");
        assert_eq!(loaded.values["b"], "2");
    }

    #[test]
    fn test_save_leaves_no_temp_or_lock_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kv.toml");
        let doc = TomlDocument::<Entries>::new(path.clone());

        doc.update(Entries::default(), |_| ()).unwrap();

        assert!(path.exists());
        assert!(!dir.path().join(".kv.toml.tmp").exists());
        assert!(!dir.path().join("kv.lock").exists());
    }

    #[test]
    fn test_parse_error_converts_to_serialization_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "values = [").unwrap();

        let err: TemplrError = TomlDocument::<Entries>::new(path).load().unwrap_err().into();
        assert!(matches!(err, TemplrError::Serialization { .. }));
    }
}
