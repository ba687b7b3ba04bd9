//! Presentation-level configuration
//!
//! Settings for the interactive chat, resolved from file config and CLI
//! flags by the binary.

use std::path::{Path, PathBuf};

/// REPL configuration for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplConfig {
    /// Show the spinner while waiting for the first token
    pub show_progress: bool,
    /// Path to history file. `None` uses the platform data directory.
    pub history_file: Option<PathBuf>,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            show_progress: true,
            history_file: None,
        }
    }
}

impl ReplConfig {
    /// History file to use: the configured one (with `~/` expanded) or
    /// `<data dir>/chatstream/history.txt`.
    pub fn resolved_history_file(&self) -> Option<PathBuf> {
        match &self.history_file {
            Some(path) => Some(expand_home(path)),
            None => dirs::data_dir().map(|p| p.join("chatstream").join("history.txt")),
        }
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_history_file_is_kept() {
        let config = ReplConfig {
            history_file: Some(PathBuf::from("/tmp/history.txt")),
            ..ReplConfig::default()
        };
        assert_eq!(
            config.resolved_history_file(),
            Some(PathBuf::from("/tmp/history.txt"))
        );
    }

    #[test]
    fn test_tilde_is_expanded() {
        let config = ReplConfig {
            history_file: Some(PathBuf::from("~/.chat_history")),
            ..ReplConfig::default()
        };
        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                config.resolved_history_file(),
                Some(home.join(".chat_history"))
            );
        }
    }
}
