//! Log destinations from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};

/// Raw logging configuration from TOML
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL conversation log. Unset disables it.
    pub conversation_log: Option<String>,
    /// Directory for daily rolling diagnostic logs. Unset logs to stderr only.
    pub log_dir: Option<String>,
}
