//! Alert core configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::audit::DEFAULT_MAX_LOGS;
use crate::error::{AlertError, Result};

/// Tunables for the alert manager and audit log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertConfig {
    /// Maximum number of audit entries retained (default: 1000, 0 = unbounded)
    #[serde(default = "default_max_logs")]
    pub max_logs: usize,

    /// Description used when a finding carries none
    #[serde(default = "default_description")]
    pub default_description: String,
}

fn default_max_logs() -> usize {
    DEFAULT_MAX_LOGS
}

fn default_description() -> String {
    "Security finding detected".to_string()
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            max_logs: default_max_logs(),
            default_description: default_description(),
        }
    }
}

impl AlertConfig {
    /// Load configuration from a JSON file.
    /// Returns default config if the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            AlertError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: AlertConfig = serde_json::from_str(&content).map_err(|e| {
            AlertError::Config(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })?;

        tracing::debug!(
            path = %path.display(),
            max_logs = config.max_logs,
            "Config loaded"
        );
        Ok(config)
    }
}
