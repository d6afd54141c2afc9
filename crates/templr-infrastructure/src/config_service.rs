//! Configuration service implementation.
//!
//! Loads [`TemplrConfig`] from `config.toml` (by default
//! `~/.config/templr/config.toml`) and caches it.

use crate::paths::TemplrPaths;
use crate::storage::TomlDocument;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use templr_core::Result;
use templr_core::config::TemplrConfig;

/// Configuration service that loads and caches the client configuration.
///
/// A missing file is created with defaults on first load. A file that fails
/// to parse is reported once and the defaults are used instead.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Cached configuration, loaded lazily on first access.
    config: Arc<RwLock<Option<TemplrConfig>>>,
}

impl ConfigService {
    /// Creates a service for the config file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Creates a service for the platform config location.
    pub fn at_default_location() -> Result<Self> {
        Ok(Self::new(TemplrPaths::config_file()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets the configuration, loading from file if not cached.
    pub fn get_config(&self) -> TemplrConfig {
        {
            let read_lock = self.config.read().unwrap_or_else(|p| p.into_inner());
            if let Some(ref cached) = *read_lock {
                return cached.clone();
            }
        }

        let loaded = match self.load_config() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    "[ConfigService] Failed to load {}: {}. Using defaults.",
                    self.path.display(),
                    e
                );
                TemplrConfig::default()
            }
        };

        let mut write_lock = self.config.write().unwrap_or_else(|p| p.into_inner());
        *write_lock = Some(loaded.clone());
        loaded
    }

    /// Persists `config` and replaces the cached copy.
    pub fn save_config(&self, config: &TemplrConfig) -> Result<()> {
        TomlDocument::new(self.path.clone()).save(config)?;
        let mut write_lock = self.config.write().unwrap_or_else(|p| p.into_inner());
        *write_lock = Some(config.clone());
        Ok(())
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self.config.write().unwrap_or_else(|p| p.into_inner());
        *write_lock = None;
    }

    fn load_config(&self) -> Result<TemplrConfig> {
        let document = TomlDocument::<TemplrConfig>::new(self.path.clone());
        match document.load()? {
            Some(config) => Ok(config),
            None => {
                let default_config = TemplrConfig::default();
                document.save(&default_config)?;
                tracing::info!(
                    "[ConfigService] Created default config at {}",
                    self.path.display()
                );
                Ok(default_config)
            }
        }
    }
}
