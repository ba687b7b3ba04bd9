//! Infrastructure layer for chatstream
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod http;
pub mod logging;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileBackendConfig, FileChatConfig, FileConfig,
    FileLoggingConfig, FileReplConfig,
};
pub use http::{HttpChatBackend, extract_error_message};
pub use logging::JsonlConversationLogger;
