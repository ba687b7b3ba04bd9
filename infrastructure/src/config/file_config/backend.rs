//! Backend connection configuration from TOML (`[backend]` section)

use super::ConfigValidationError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Raw backend configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBackendConfig {
    /// Root URL of the chat service; `/api/...` paths are joined onto it
    pub base_url: String,
    /// Longest silence allowed between two reads of a response; a reply
    /// may stream for longer as long as data keeps arriving
    pub read_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for FileBackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            read_timeout_secs: 300,
            connect_timeout_secs: 10,
        }
    }
}

impl FileBackendConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub(super) fn validate(&self) -> Vec<ConfigValidationError> {
        let mut issues = Vec::new();
        let url = self.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            issues.push(ConfigValidationError::InvalidBaseUrl(self.base_url.clone()));
        }
        if self.read_timeout_secs == 0 {
            issues.push(ConfigValidationError::ZeroTimeout("read_timeout_secs"));
        }
        if self.connect_timeout_secs == 0 {
            issues.push(ConfigValidationError::ZeroTimeout("connect_timeout_secs"));
        }
        issues
    }
}
