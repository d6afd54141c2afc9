//! Platform paths for Templr's local files.
//!
//! ```text
//! ~/.config/templr/            # Config directory (XDG on Linux)
//! └── config.toml              # Client configuration
//!
//! ~/.local/share/templr/       # Data directory
//! └── interactions.toml        # Liked/viewed listing ids for this profile
//! ```

use std::path::PathBuf;
use templr_core::TemplrError;

const APP_DIR: &str = "templr";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Platform directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for TemplrError {
    fn from(err: PathError) -> Self {
        TemplrError::config(err.to_string())
    }
}

/// Resolves Templr's directories via the `dirs` crate.
pub struct TemplrPaths;

impl TemplrPaths {
    /// Returns the config directory (e.g. `~/.config/templr/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the data directory (e.g. `~/.local/share/templr/`).
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn interactions_file() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("interactions.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_files_live_under_app_dirs() {
        // Skip silently on hosts without a home directory.
        if let (Ok(config), Ok(dir)) = (TemplrPaths::config_file(), TemplrPaths::config_dir()) {
            assert!(config.starts_with(&dir));
            assert!(dir.ends_with("templr"));
        }
        if let Ok(file) = TemplrPaths::interactions_file() {
            assert_eq!(file.file_name().unwrap(), "interactions.toml");
        }
    }
}
