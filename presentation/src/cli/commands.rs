//! CLI command definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for chatstream
#[derive(Parser, Debug)]
#[command(name = "chatstream")]
#[command(author, version, about = "Terminal client for a streaming LLM chat service")]
#[command(long_about = r#"
chatstream talks to a chat backend over HTTP and renders replies as they
stream in, token by token.

Without a message it starts an interactive chat. Conversations are stored by
the backend and can be listed, resumed and deleted from the chat.

Configuration files are loaded from (in priority order):
1. CHATSTREAM_* environment variables (e.g. CHATSTREAM_BACKEND__BASE_URL)
2. --config <path>         Explicit config file
3. ./chatstream.toml       Project-level config
4. ~/.config/chatstream/config.toml   Global config

Example:
  chatstream
  chatstream -m mistral "Explain Rust lifetimes in one paragraph"
  chatstream --resume 3f2a9c --base-url http://gpu-box:8000
"#)]
pub struct Cli {
    /// Send a single message, print the reply and exit
    pub message: Option<String>,

    /// Model to chat with (defaults to the backend's default model)
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Base URL of the chat backend
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Continue a stored chat by id
    #[arg(short, long, value_name = "CHAT_ID")]
    pub resume: Option<String>,

    /// List stored chats and exit
    #[arg(long, conflicts_with = "message")]
    pub list_chats: bool,

    /// List available models and exit
    #[arg(long, conflicts_with = "message")]
    pub list_models: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}
