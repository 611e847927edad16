// Store Configuration

use crate::platform::PlatformPreference;
use qrmaster_core::error::{Result, StoreError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_DATABASE_NAME: &str = "qrmaster.db";
pub const DEFAULT_DATABASE_VERSION: i64 = 1;
pub const DEFAULT_IMAGE_KEY: &str = "data";

/// Backend selection and storage locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub platform: PlatformPreference,
    pub database_name: String,
    pub database_version: i64,
    /// Directory holding native database files
    pub data_dir: PathBuf,
    /// Directory backing the durable store of the in-memory engine
    pub durable_store_dir: PathBuf,
    /// Key of the database image inside the durable store
    pub image_key: String,
    /// Directory of legacy JSON documents, if any
    pub legacy_dir: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            platform: PlatformPreference::Auto,
            database_name: DEFAULT_DATABASE_NAME.to_string(),
            database_version: DEFAULT_DATABASE_VERSION,
            data_dir: PathBuf::from("data"),
            durable_store_dir: PathBuf::from("data/durable"),
            image_key: DEFAULT_IMAGE_KEY.to_string(),
            legacy_dir: None,
        }
    }
}

impl StoreConfig {
    /// Path of the native database file
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_name)
    }

    pub fn validate(&self) -> Result<()> {
        if self.database_name.trim().is_empty() {
            return Err(StoreError::Config("database_name must not be empty".to_string()));
        }
        if self.database_version < 1 {
            return Err(StoreError::Config(format!(
                "database_version must be at least 1, got {}",
                self.database_version
            )));
        }
        if self.image_key.trim().is_empty() {
            return Err(StoreError::Config("image_key must not be empty".to_string()));
        }
        Ok(())
    }
}
