// Settings Domain Model

use serde::{Deserialize, Serialize};

/// Reserved key: set once the legacy import has fully completed
pub const MIGRATED_V1: &str = "migrated_v1";

/// Generic key/value setting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingEntry {
    pub key: String,
    pub value: String,
}
