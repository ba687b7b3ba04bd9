//! Configuration file loading for chatstream
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. Environment: `CHATSTREAM_<SECTION>__<KEY>`
//! 2. `--config <path>` specified file
//! 3. Project root: `./chatstream.toml` or `./.chatstream.toml`
//! 4. Global: `$XDG_CONFIG_HOME/chatstream/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, DEFAULT_BASE_URL, FileBackendConfig, FileChatConfig, FileConfig,
    FileLoggingConfig, FileReplConfig,
};
pub use loader::ConfigLoader;
