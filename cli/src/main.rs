//! CLI entrypoint for chatstream
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow};
use chatstream_application::{
    ChatBackend, ConversationLogger, FALLBACK_MODEL, ManageChatsUseCase, SendMessageInput,
    SendMessageUseCase, SessionStore,
};
use chatstream_infrastructure::{
    ConfigLoader, FileConfig, FileLoggingConfig, HttpChatBackend, JsonlConversationLogger,
};
use chatstream_presentation::{ChatRepl, Cli, ConsoleFormatter, ReplConfig, TerminalRenderer};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize logging based on verbosity level.
///
/// The returned guard flushes the log file on drop and must live until exit.
fn init_tracing(verbose: u8, logging: &FileLoggingConfig) -> Option<WorkerGuard> {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let (file_layer, guard) = match logging.log_dir.as_deref() {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "chatstream.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard
}

fn load_config(cli: &Cli) -> Result<FileConfig> {
    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };

    // CLI flags win over every file and env source
    if let Some(base_url) = &cli.base_url {
        config.backend.base_url = base_url.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_deref());
        return Ok(ExitCode::SUCCESS);
    }

    let config = load_config(&cli)?;
    let _log_guard = init_tracing(cli.verbose, &config.logging);

    info!("Starting chatstream");
    for issue in config.validate() {
        warn!("Config: {}", issue);
    }

    // === Dependency Injection ===
    let backend: Arc<dyn ChatBackend> = Arc::new(
        HttpChatBackend::from_config(&config.backend).context("Invalid backend configuration")?,
    );
    let store = SessionStore::new(FALLBACK_MODEL);

    let mut send = SendMessageUseCase::new(backend.clone(), store.clone());
    if let Some(path) = config.logging.conversation_log.as_deref()
        && let Some(logger) = JsonlConversationLogger::open(path)
    {
        info!("Conversation log: {}", logger.path().display());
        let logger: Arc<dyn ConversationLogger> = Arc::new(logger);
        send = send.with_conversation_logger(logger);
    }
    let chats = ManageChatsUseCase::new(backend, store.clone());

    let preferred = cli.model.as_deref().or(config.chat.default_model.as_deref());
    let model = chats.resolve_model(preferred).await;
    info!("Using model {}", model);

    if cli.list_models {
        let catalog = chats.list_models().await?;
        print!("{}", ConsoleFormatter::format_models(&catalog, &model));
        return Ok(ExitCode::SUCCESS);
    }

    if cli.list_chats {
        let list = chats.list_chats().await?;
        print!("{}", ConsoleFormatter::format_chat_list(&list, None));
        return Ok(ExitCode::SUCCESS);
    }

    if let Some(chat_id) = cli.resume.as_deref() {
        chats
            .load_chat(chat_id)
            .await
            .with_context(|| format!("Could not resume chat {}", chat_id))?;
        // An explicit -m beats the model stored with the chat
        if let Some(model) = cli.model.as_deref() {
            store.set_model(model);
        }
    }

    let show_progress = config.repl.show_progress && !cli.quiet;

    // Single message mode
    if let Some(message) = cli.message {
        let renderer = TerminalRenderer::new(show_progress);
        return match send.execute(SendMessageInput::new(message), &renderer).await {
            Ok(_) => Ok(ExitCode::SUCCESS),
            // The renderer already reported stream failures
            Err(e) if e.is_local() => Err(e.into()),
            Err(_) => Ok(ExitCode::FAILURE),
        };
    }

    let repl_config = ReplConfig {
        show_progress,
        history_file: config.repl.history_file.map(PathBuf::from),
    };
    ChatRepl::new(send, chats, repl_config).run().await?;

    Ok(ExitCode::SUCCESS)
}
