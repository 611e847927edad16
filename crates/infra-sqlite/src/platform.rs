// Platform Detection

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Configured backend preference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformPreference {
    #[default]
    Auto,
    Native,
    Web,
}

impl FromStr for PlatformPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(PlatformPreference::Auto),
            "native" => Ok(PlatformPreference::Native),
            "web" => Ok(PlatformPreference::Web),
            other => Err(format!("unknown platform: {}", other)),
        }
    }
}

/// Runtime environment the backend is chosen for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Persistent named file through the native connection registry
    Native,
    /// In-memory engine persisted as one image in a durable store
    Web,
}

impl Platform {
    /// Decide once; an explicit preference always wins
    pub fn detect(preference: PlatformPreference) -> Self {
        match preference {
            PlatformPreference::Native => Platform::Native,
            PlatformPreference::Web => Platform::Web,
            PlatformPreference::Auto => Self::current(),
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn current() -> Self {
        Platform::Web
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn current() -> Self {
        Platform::Native
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Native => "native",
            Platform::Web => "web",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
