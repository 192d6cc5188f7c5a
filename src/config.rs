use crate::errors::{AppError, AppResult};
use crate::store::DEFAULT_STORAGE_KEY;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "tracker.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrackerConfig {
    pub storage_key: String,
    pub database_file: String,
    pub log_filter: String,
    pub log_file: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            database_file: "tracker.db".to_string(),
            log_filter: "info".to_string(),
            log_file: "tracker.log".to_string(),
        }
    }
}

impl TrackerConfig {
    pub fn load(data_dir: &Path) -> AppResult<Self> {
        let path = data_dir.join(CONFIG_FILE_NAME);
        if !path.is_file() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(&path)?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(&raw)
            .map_err(|error| AppError::Config(format!("{}: {}", path.display(), error)))?;
        Ok(config.with_fallbacks())
    }

    fn with_fallbacks(self) -> Self {
        let defaults = Self::default();
        Self {
            storage_key: non_blank(self.storage_key, defaults.storage_key),
            database_file: non_blank(self.database_file, defaults.database_file),
            log_filter: non_blank(self.log_filter, defaults.log_filter),
            log_file: non_blank(self.log_file, defaults.log_file),
        }
    }
}

fn non_blank(value: String, fallback: String) -> String {
    if value.trim().is_empty() {
        fallback
    } else {
        value.trim().to_string()
    }
}
