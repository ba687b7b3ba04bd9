//! Conversation defaults from TOML (`[chat]` section)

use serde::{Deserialize, Serialize};

/// Raw chat configuration from TOML
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileChatConfig {
    /// Model selected at startup. Unset means: ask the backend.
    pub default_model: Option<String>,
}
