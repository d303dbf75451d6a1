//! Connection profiles.
//!
//! # Storage layout
//!
//! ```text
//! ~/.prettysync/
//!   connections.yaml
//! ```
//!
//! ```yaml
//! connections:
//!   dev:
//!     url: https://dev.example.com:44300
//!     user: DEVELOPER
//!     client: "001"
//! ```
//!
//! # API pattern
//!
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// One named remote system.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConnectionProfile {
    pub url: String,
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Root of `connections.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default)]
    pub connections: BTreeMap<String, ConnectionProfile>,
}

impl ConnectionConfig {
    pub fn profile(&self, name: &str) -> Result<&ConnectionProfile, ConfigError> {
        self.connections
            .get(name)
            .ok_or_else(|| ConfigError::UnknownConnection(name.to_string()))
    }
}

/// `<home>/.prettysync/connections.yaml`: pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".prettysync").join("connections.yaml")
}

/// Load connection profiles. A missing file yields an empty config.
pub fn load_at(home: &Path) -> Result<ConnectionConfig, ConfigError> {
    let path = config_path_at(home);
    if !path.exists() {
        return Ok(ConnectionConfig::default());
    }
    let contents = std::fs::read_to_string(&path)?;
    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<ConnectionConfig, ConfigError> {
    load_at(&home()?)
}

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}
