//! Configuration service implementation.
//!
//! Loads the root configuration from `config.toml`, either at an explicit
//! path or at the platform default (`~/.config/echec/config.toml`).

use crate::paths::EchecPaths;
use echec_core::config::RootConfig;
use echec_core::error::Result;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

/// Configuration service that loads and caches the root configuration.
///
/// The file is read once; later calls are served from the cache until
/// [`ConfigService::invalidate_cache`] is called.
#[derive(Debug, Clone, Default)]
pub struct ConfigService {
    /// Explicit file location; `None` means the platform default.
    path: Option<PathBuf>,
    config: Arc<RwLock<Option<RootConfig>>>,
}

impl ConfigService {
    /// Creates a service reading the platform default location.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a service reading `path`.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn config_path(&self) -> Result<PathBuf> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => EchecPaths::config_file(None),
        }
    }

    /// Gets the root configuration, loading from file if not cached.
    ///
    /// A missing file yields the defaults. A file that does not parse or
    /// does not validate is an error.
    pub fn get_config(&self) -> Result<RootConfig> {
        {
            let cached = self.config.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(config) = cached.as_ref() {
                return Ok(config.clone());
            }
        }

        let loaded = self.load_config()?;

        let mut cached = self.config.write().unwrap_or_else(PoisonError::into_inner);
        *cached = Some(loaded.clone());
        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut cached = self.config.write().unwrap_or_else(PoisonError::into_inner);
        *cached = None;
    }

    /// Writes `config` to the configuration file and caches it.
    pub fn save(&self, config: &RootConfig) -> Result<()> {
        config.validate()?;
        let path = self.config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, toml::to_string_pretty(config)?)?;
        tracing::info!("[ConfigService] Saved configuration to {}", path.display());

        let mut cached = self.config.write().unwrap_or_else(PoisonError::into_inner);
        *cached = Some(config.clone());
        Ok(())
    }

    fn load_config(&self) -> Result<RootConfig> {
        let path = self.config_path()?;
        if !path.exists() {
            tracing::debug!(
                "[ConfigService] {} not found, using defaults",
                path.display()
            );
            return Ok(RootConfig::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let config = RootConfig::from_toml_str(&content)?;
        tracing::debug!("[ConfigService] Loaded {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use echec_core::config::LookupRetention;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let service = ConfigService::with_path(dir.path().join("config.toml"));
        assert_eq!(service.get_config().unwrap(), RootConfig::default());
    }

    #[test]
    fn test_partial_file_is_merged_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[conversations]\nlookup_retention = \"retain\"\n",
        )
        .unwrap();

        let config = ConfigService::with_path(&path).get_config().unwrap();
        assert_eq!(config.conversations.lookup_retention, LookupRetention::Retain);
        assert_eq!(config.conversations.default_avatar, "/image.png");
        assert_eq!(config.profile.max_selected_games, 4);
    }

    #[test]
    fn test_cache_until_invalidated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let service = ConfigService::with_path(&path);
        assert_eq!(service.get_config().unwrap().log_level, "info");

        std::fs::write(&path, "log_level = \"debug\"\n").unwrap();
        assert_eq!(service.get_config().unwrap().log_level, "info");

        service.invalidate_cache();
        assert_eq!(service.get_config().unwrap().log_level, "debug");
    }

    #[test]
    fn test_save_round_trips_through_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let service = ConfigService::with_path(&path);

        let mut config = RootConfig::default();
        config.conversations.fallback_label = "Joueur".to_string();
        service.save(&config).unwrap();

        let reread = ConfigService::with_path(&path).get_config().unwrap();
        assert_eq!(reread.conversations.fallback_label, "Joueur");
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[conversations]\nevent_capacity = 0\n").unwrap();

        let err = ConfigService::with_path(&path).get_config().unwrap_err();
        assert!(matches!(err, echec_core::EchecError::Config(_)));
    }
}
