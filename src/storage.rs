//! Persistence of the clock record.

use crate::error::StorageError;
use crate::model::ClockConfig;
use std::io::Write;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "configuration.json";

/// Loads and saves the persisted clock record.
pub trait PositionStore {
    fn load(&self) -> Result<ClockConfig, StorageError>;
    fn save(&self, config: &ClockConfig) -> Result<(), StorageError>;
}

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("station-clock")
        .join(CONFIG_FILE_NAME)
}

/// Load the record, falling back to defaults when it is missing or unreadable.
pub fn load_or_default(store: &impl PositionStore) -> ClockConfig {
    match store.load() {
        Ok(cfg) => {
            tracing::info!(display = %cfg.display, timezone_url = %cfg.timezone_url, "configuration loaded");
            cfg
        }
        Err(e) => {
            tracing::warn!(error = %e, "using default configuration");
            ClockConfig::default()
        }
    }
}

/// JSON file store. Writes go through a sibling temp file and a rename so a
/// crash mid-write leaves the previous record intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| CONFIG_FILE_NAME.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl PositionStore for JsonFileStore {
    fn load(&self) -> Result<ClockConfig, StorageError> {
        let raw = std::fs::read_to_string(&self.path).map_err(|source| StorageError::Read {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| StorageError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, config: &ClockConfig) -> Result<(), StorageError> {
        let data = serde_json::to_vec_pretty(config)?;
        let write_err = |source| StorageError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }

        let tmp = self.temp_path();
        let mut file = std::fs::File::create(&tmp).map_err(write_err)?;
        file.write_all(&data).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;
        drop(file);
        std::fs::rename(&tmp, &self.path).map_err(write_err)?;
        Ok(())
    }
}
