//! Configuration file handling for the cashbook.
//!
//! The configuration file is stored at `$CASHBOOK_HOME/config.json`. The persisted tables live in
//! the same directory.

use crate::state::Settings;
use crate::store::JsonStore;
use crate::{utils, Result};
use anyhow::{bail, Context};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "cashbook";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";
const PER_PAGE: usize = 20;
/// UTC+08:00
const UTC_OFFSET_MINUTES: i32 = 480;

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$CASHBOOK_HOME` and from there it loads `$CASHBOOK_HOME/config.json`.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    utc_offset: FixedOffset,
}

impl Config {
    /// Creates the data directory and writes an initial `config.json` with default settings.
    ///
    /// # Errors
    /// - Returns an error if any file operations fail or if a config file already exists.
    pub async fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the cashbook home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if config_path.is_file() {
            bail!("A config file already exists at '{}'", config_path.display())
        }

        let config_file = ConfigFile::default();
        config_file.save(&config_path).await?;
        let utc_offset = config_file.utc_offset()?;

        Ok(Self {
            root,
            config_path,
            config_file,
            utc_offset,
        })
    }

    /// This will
    /// - validate that `cashbook_home` and its config file exist
    /// - load and validate the config file
    /// - return the loaded configuration object
    pub async fn load(cashbook_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = cashbook_home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("Cashbook home is missing, run 'cashbook init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;
        let utc_offset = config_file.utc_offset()?;

        Ok(Self {
            root,
            config_path,
            config_file,
            utc_offset,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn per_page(&self) -> usize {
        self.config_file.per_page
    }

    pub fn utc_offset(&self) -> FixedOffset {
        self.utc_offset
    }

    pub fn settings(&self) -> Settings {
        Settings {
            per_page: self.per_page(),
            utc_offset: self.utc_offset,
        }
    }

    /// The store for the tables in the home directory.
    pub fn store(&self) -> JsonStore {
        JsonStore::new(&self.root)
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "cashbook",
///   "config_version": 1,
///   "per_page": 20,
///   "utc_offset_minutes": 480
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "cashbook"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Rows per page when listing bills
    #[serde(default = "default_per_page")]
    per_page: usize,

    /// The offset from UTC, in minutes, used to place bill times in months
    #[serde(default = "default_utc_offset_minutes")]
    utc_offset_minutes: i32,
}

fn default_per_page() -> usize {
    PER_PAGE
}

fn default_utc_offset_minutes() -> i32 {
    UTC_OFFSET_MINUTES
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            per_page: PER_PAGE,
            utc_offset_minutes: UTC_OFFSET_MINUTES,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile asynchronously from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if its values are invalid
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path)
            .await
            .with_context(|| format!("Failed to load config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        anyhow::ensure!(
            config.per_page >= 1,
            "Invalid per_page in config file: it must be at least 1"
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        utils::serialize(path.as_ref(), self)
            .await
            .context("Unable to write config file")
    }

    fn utc_offset(&self) -> Result<FixedOffset> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .with_context(|| {
                format!(
                    "Invalid utc_offset_minutes in config file: {}",
                    self.utc_offset_minutes
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_config_create() {
        let dir = TempDir::new().unwrap();
        let home_dir = dir.path().join("cashbook_home");

        let config = Config::create(&home_dir).await.unwrap();

        assert!(config.config_path().is_file());
        assert_eq!(config.per_page(), 20);
        assert_eq!(config.utc_offset().local_minus_utc(), 8 * 3600);
        assert_eq!(
            config.store().bill_path(),
            config.root().join("bill.json").as_path()
        );

        let loaded = Config::load(&home_dir).await.unwrap();
        assert_eq!(loaded.settings(), config.settings());
    }

    #[tokio::test]
    async fn test_config_create_twice_fails() {
        let dir = TempDir::new().unwrap();
        Config::create(dir.path()).await.unwrap();
        assert!(Config::create(dir.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_config_load_missing_home() {
        let dir = TempDir::new().unwrap();
        assert!(Config::load(dir.path().join("nope")).await.is_err());
        assert!(Config::load(dir.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_config_file_load_with_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        utils::write(&config_path, r#"{"app_name": "cashbook", "config_version": 1}"#)
            .await
            .unwrap();

        let config = ConfigFile::load(&config_path).await.unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        utils::write(&config_path, r#"{"app_name": "ledger", "config_version": 1}"#)
            .await
            .unwrap();

        let result = ConfigFile::load(&config_path).await;
        assert!(result.unwrap_err().to_string().contains("Invalid app_name"));
    }

    #[tokio::test]
    async fn test_config_file_load_zero_per_page() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        utils::write(
            &config_path,
            r#"{"app_name": "cashbook", "config_version": 1, "per_page": 0}"#,
        )
        .await
        .unwrap();
        assert!(ConfigFile::load(&config_path).await.is_err());
    }

    #[test]
    fn test_utc_offset() {
        let mut config = ConfigFile::default();
        config.utc_offset_minutes = -300;
        assert_eq!(config.utc_offset().unwrap().local_minus_utc(), -5 * 3600);
        config.utc_offset_minutes = 24 * 60;
        assert!(config.utc_offset().is_err());
    }
}
