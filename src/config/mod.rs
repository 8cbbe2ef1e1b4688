//! Configuration management for Shipwright

pub mod schema;

pub use schema::{BuildMode, Config};

use crate::error::{ShipwrightError, ShipwrightResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Project configuration file name
pub const CONFIG_FILE_NAME: &str = "shipwright.toml";

/// A configuration together with where it came from
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Configuration with every path made absolute
    pub config: Config,
    /// File it was read from, `None` when running on defaults
    pub path: Option<PathBuf>,
    /// Directory relative paths were resolved against
    pub base_dir: PathBuf,
}

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with the user-level default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// User-level fallback config (`~/.config/shipwright/shipwright.toml`)
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shipwright")
            .join(CONFIG_FILE_NAME)
    }

    /// Walk up from `start` looking for a project config file
    pub fn find_local_config(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .find(|candidate| candidate.is_file())
    }

    /// Resolve and load the configuration for a run.
    ///
    /// An explicit path must exist. Otherwise the nearest project file
    /// wins, then the user-level file, then built-in defaults rooted at
    /// `cwd`.
    pub async fn resolve(explicit: Option<&Path>, cwd: &Path) -> ShipwrightResult<LoadedConfig> {
        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(ShipwrightError::ConfigNotFound(path.to_path_buf()));
            }
            return Self::with_path(path.to_path_buf()).load().await;
        }

        if let Some(found) = Self::find_local_config(cwd) {
            debug!("Found local config: {}", found.display());
            return Self::with_path(found).load().await;
        }

        let manager = Self::new();
        if manager.config_path.is_file() {
            debug!("Using user config: {}", manager.config_path.display());
            return manager.load().await;
        }

        debug!("No config file found, using defaults");
        let mut config = Config::default();
        config.resolve_paths(cwd);
        Ok(LoadedConfig {
            config,
            path: None,
            base_dir: cwd.to_path_buf(),
        })
    }

    /// Load the configuration file, resolving paths against its directory
    pub async fn load(&self) -> ShipwrightResult<LoadedConfig> {
        let mut config = self.load_from_file(&self.config_path).await?;
        let base_dir = self
            .config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let base_dir = std::path::absolute(&base_dir)
            .map_err(|e| ShipwrightError::io(format!("resolving {}", base_dir.display()), e))?;
        config.resolve_paths(&base_dir);
        Ok(LoadedConfig {
            config,
            path: Some(self.config_path.clone()),
            base_dir,
        })
    }

    /// Parse a configuration file without resolving paths
    pub async fn load_from_file(&self, path: &Path) -> ShipwrightResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| ShipwrightError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| ShipwrightError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> ShipwrightResult<()> {
        if let Some(parent) = self.config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ShipwrightError::io(format!("creating {}", parent.display()), e))?;
        }

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            ShipwrightError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        let manager = ConfigManager::with_path(path.clone());

        let mut config = Config::default();
        config.package.product_name = "Reviewer Match".to_string();

        manager.save(&config).await.unwrap();
        let loaded = manager.load().await.unwrap();

        assert_eq!(loaded.config.package.product_name, "Reviewer Match");
        assert_eq!(loaded.path, Some(path));
    }

    #[tokio::test]
    async fn paths_resolve_against_config_dir() {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("project");
        std::fs::create_dir_all(&project).unwrap();
        std::fs::write(
            project.join(CONFIG_FILE_NAME),
            "[runtime]\nrequirements = \"deps/requirements.txt\"\n",
        )
        .unwrap();

        let loaded = ConfigManager::with_path(project.join(CONFIG_FILE_NAME))
            .load()
            .await
            .unwrap();

        assert_eq!(
            loaded.config.runtime.requirements,
            project.join("deps/requirements.txt")
        );
    }

    #[tokio::test]
    async fn discovery_walks_upward() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("src-tauri/src");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE_NAME), "").unwrap();

        let found = ConfigManager::find_local_config(&nested).unwrap();
        assert_eq!(found, temp.path().join(CONFIG_FILE_NAME));

        let loaded = ConfigManager::resolve(None, &nested).await.unwrap();
        assert_eq!(loaded.base_dir, temp.path());
    }

    #[tokio::test]
    async fn explicit_missing_config_is_an_error() {
        let temp = TempDir::new().unwrap();
        let err = ConfigManager::resolve(Some(&temp.path().join("nope.toml")), temp.path())
            .await
            .unwrap_err();
        assert!(matches!(err, ShipwrightError::ConfigNotFound(_)));
    }

    #[tokio::test]
    async fn invalid_config_reports_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[runtime\n").unwrap();

        let err = ConfigManager::with_path(path).load().await.unwrap_err();
        assert!(matches!(err, ShipwrightError::ConfigInvalid { .. }));
    }
}
