//! Presentation layer for chatstream
//!
//! This crate contains CLI definitions, console formatting, the live
//! stream renderer, and the interactive chat interface.

pub mod chat;
pub mod cli;
pub mod config;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use chat::{ChatRepl, ReplCommand};
pub use cli::commands::Cli;
pub use config::ReplConfig;
pub use output::console::ConsoleFormatter;
pub use progress::renderer::TerminalRenderer;
