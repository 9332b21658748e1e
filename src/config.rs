// Configuration: where and how the task list is stored

use crate::file_storage::FileStorage;
use crate::sqlite_storage::SqliteStorage;
use crate::storage::KeyValueStorage;
use crate::store::DEFAULT_KEY;
use crate::task::{DEFAULT_DATE_FORMAT, validate_date_format};
use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_NAME: &str = "tasklist";
const CONFIG_FILE_NAME: &str = "config.yaml";
const CONFIG_ENV_VAR: &str = "TASKLIST_CONFIG_PATH";
const SQLITE_FILE_NAME: &str = "tasklist.db";

/// Storage backend for the task slot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// One JSON file per key
    #[default]
    File,
    /// A key-value table in a SQLite database
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: Backend,
    /// Directory holding the storage files
    pub store_path: Option<PathBuf>,
    /// Name of the slot holding the task collection
    pub key: String,
    /// chrono format string for `createdAt`
    pub date_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            store_path: None,
            key: DEFAULT_KEY.to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

impl Config {
    /// Resolved storage directory
    pub fn store_dir(&self) -> Result<PathBuf> {
        if let Some(path) = &self.store_path {
            return Ok(path.clone());
        }
        dirs::data_dir()
            .map(|dir| dir.join(APP_NAME))
            .ok_or_else(|| eyre!("Could not determine data directory"))
    }

    /// Open the configured storage backend
    pub fn open_storage(&self) -> Result<Box<dyn KeyValueStorage>> {
        let dir = self.store_dir()?;
        debug!(backend = ?self.backend, dir = ?dir, "Opening storage");

        let storage: Box<dyn KeyValueStorage> = match self.backend {
            Backend::File => Box::new(FileStorage::open(&dir)?),
            Backend::Sqlite => Box::new(SqliteStorage::open(dir.join(SQLITE_FILE_NAME))?),
        };
        Ok(storage)
    }
}

/// Location of the config file
///
/// `TASKLIST_CONFIG_PATH` overrides the platform config directory.
pub fn config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    dirs::config_dir()
        .map(|dir| dir.join(APP_NAME).join(CONFIG_FILE_NAME))
        .ok_or_else(|| eyre!("Could not determine config directory"))
}

/// Load the config from its default location
pub fn load_config() -> Result<Config> {
    load_config_from_path(&config_path()?)
}

/// Load the config at `path`; a missing file yields the defaults
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    if !path.exists() {
        debug!(path = ?path, "No config file, using defaults");
        return Ok(Config::default());
    }

    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    validate_date_format(&config.date_format)
        .with_context(|| format!("Invalid date_format in config file: {}", path.display()))?;
    Ok(config)
}
