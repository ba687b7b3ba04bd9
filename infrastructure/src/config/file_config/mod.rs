//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.

mod backend;
mod chat;
mod logging;
mod repl;

pub use backend::{DEFAULT_BASE_URL, FileBackendConfig};
pub use chat::FileChatConfig;
pub use logging::FileLoggingConfig;
pub use repl::FileReplConfig;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigValidationError {
    #[error("backend.base_url must start with http:// or https:// (got '{0}')")]
    InvalidBaseUrl(String),

    #[error("backend.{0} cannot be 0")]
    ZeroTimeout(&'static str),

    #[error("chat.default_model cannot be empty")]
    EmptyModelName,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Chat backend connection
    pub backend: FileBackendConfig,
    /// Conversation defaults
    pub chat: FileChatConfig,
    /// REPL settings
    pub repl: FileReplConfig,
    /// Log destinations
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut issues = self.backend.validate();

        if let Some(model) = &self.chat.default_model
            && model.trim().is_empty()
        {
            issues.push(ConfigValidationError::EmptyModelName);
        }

        issues
    }
}
