//! REPL (Read-Eval-Print Loop) for interactive chat

use super::command::{HELP, ReplCommand};
use crate::config::ReplConfig;
use crate::output::console::ConsoleFormatter;
use crate::progress::renderer::TerminalRenderer;
use chatstream_application::{
    ChatError, ManageChatsUseCase, SendMessageInput, SendMessageUseCase, SessionStore,
};
use chatstream_domain::{Role, derive_title};
use colored::Colorize;
use reedline::{DefaultPrompt, DefaultPromptSegment, FileBackedHistory, Reedline, Signal};
use tracing::warn;

const HISTORY_CAPACITY: usize = 1000;

/// Interactive chat REPL
pub struct ChatRepl {
    send: SendMessageUseCase,
    chats: ManageChatsUseCase,
    renderer: TerminalRenderer,
    config: ReplConfig,
}

impl ChatRepl {
    /// Create a new ChatRepl over use cases sharing one session store
    pub fn new(send: SendMessageUseCase, chats: ManageChatsUseCase, config: ReplConfig) -> Self {
        let renderer = TerminalRenderer::new(config.show_progress);
        Self {
            send,
            chats,
            renderer,
            config,
        }
    }

    fn store(&self) -> &SessionStore {
        self.send.store()
    }

    fn line_editor(&self) -> Reedline {
        let editor = Reedline::create();
        let Some(path) = self.config.resolved_history_file() else {
            return editor;
        };

        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match FileBackedHistory::with_file(HISTORY_CAPACITY, path.clone()) {
            Ok(history) => editor.with_history(Box::new(history)),
            Err(e) => {
                warn!("History disabled ({}): {}", path.display(), e);
                editor
            }
        }
    }

    fn prompt(&self) -> DefaultPrompt {
        DefaultPrompt::new(
            DefaultPromptSegment::Basic(self.store().model_id()),
            DefaultPromptSegment::Empty,
        )
    }

    /// Run the interactive REPL until `/quit` or end of input
    pub async fn run(&self) -> std::io::Result<()> {
        let mut editor = self.line_editor();
        self.print_welcome();

        loop {
            match editor.read_line(&self.prompt()) {
                Ok(Signal::Success(line)) => {
                    let Some(command) = ReplCommand::parse(&line) else {
                        continue;
                    };
                    if !self.handle(command, &mut editor).await {
                        break;
                    }
                }
                Ok(Signal::CtrlC) => {
                    println!("^C");
                }
                Ok(_) => {
                    println!("Bye!");
                    break;
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return Err(e);
                }
            }
        }

        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│              chatstream - Chat              │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        println!("Model: {}", self.store().model_id().bold());
        if let Some(chat_id) = self.store().chat_id() {
            println!("Chat:  {}", chat_id.yellow());
        }
        println!();
        println!("Type a message, or /help for commands.");
        println!();
    }

    /// Execute one command. Returns false if the REPL should exit.
    async fn handle(&self, command: ReplCommand, editor: &mut Reedline) -> bool {
        match command {
            ReplCommand::Message(text) => self.process_message(&text).await,
            ReplCommand::Help => {
                println!();
                println!("{}", HELP);
                println!();
            }
            ReplCommand::Quit => {
                println!("Bye!");
                return false;
            }
            ReplCommand::NewChat => match self.chats.new_chat().await {
                Some(chat_id) => println!("{} {}", "Started chat".dimmed(), chat_id.yellow()),
                None => println!("{}", "Started a new chat.".dimmed()),
            },
            ReplCommand::ListChats => match self.chats.list_chats().await {
                Ok(chats) => {
                    let active = self.store().chat_id();
                    print!(
                        "{}",
                        ConsoleFormatter::format_chat_list(&chats, active.as_deref())
                    );
                }
                Err(e) => print_error(&e),
            },
            ReplCommand::LoadChat(chat_id) => match self.chats.load_chat(&chat_id).await {
                Ok(state) => {
                    println!();
                    print!("{}", ConsoleFormatter::format_transcript(&state.transcript));
                    println!(
                        "{}",
                        format!("Loaded chat {} ({})", chat_id, state.model_id).dimmed()
                    );
                }
                Err(e) => print_error(&e),
            },
            ReplCommand::DeleteChat(chat_id) => match self.chats.delete_chat(&chat_id).await {
                Ok(()) => println!("Deleted chat {}", chat_id.yellow()),
                Err(e) => print_error(&e),
            },
            ReplCommand::DeleteAllChats => {
                if confirm(editor, "Delete ALL saved chats? [y/N]") {
                    match self.chats.delete_all_chats().await {
                        Ok(report) if report.failed == 0 => {
                            println!("Deleted {} chats", report.deleted)
                        }
                        Ok(report) => println!(
                            "Deleted {} chats, {} {}",
                            report.deleted,
                            report.failed,
                            "failed".red()
                        ),
                        Err(e) => print_error(&e),
                    }
                }
            }
            ReplCommand::ListModels => match self.chats.list_models().await {
                Ok(catalog) => print!(
                    "{}",
                    ConsoleFormatter::format_models(&catalog, &self.store().model_id())
                ),
                Err(e) => print_error(&e),
            },
            ReplCommand::Model(None) => println!("Model: {}", self.store().model_id().bold()),
            ReplCommand::Model(Some(model)) => {
                if self.store().is_streaming() {
                    print_error(&ChatError::ConcurrentRequest);
                } else {
                    self.store().set_model(model.as_str());
                    println!("Switched to {}", model.bold());
                }
            }
            ReplCommand::ShowHistory => {
                let state = self.store().current_state();
                if state.is_empty() {
                    println!("{}", "No messages yet.".dimmed());
                } else {
                    println!("{}", derive_title(&state.transcript).bold());
                    println!();
                    print!("{}", ConsoleFormatter::format_transcript(&state.transcript));
                }
            }
            ReplCommand::MissingArgument(usage) => println!("Usage: {}", usage),
            ReplCommand::Unknown(name) => {
                println!("Unknown command: {}", name);
                println!("Type /help for available commands");
            }
        }
        true
    }

    async fn process_message(&self, text: &str) {
        println!();
        print!("{} ", ConsoleFormatter::role_label(Role::Assistant));

        // The renderer reports every failure of a started stream itself.
        if let Err(e) = self
            .send
            .execute(SendMessageInput::new(text), &self.renderer)
            .await
            && e.is_local()
        {
            println!();
            print_error(&e);
        }
        println!();
    }
}

fn print_error(error: &ChatError) {
    eprintln!("{} {}", "Error:".red().bold(), error);
}

fn confirm(editor: &mut Reedline, question: &str) -> bool {
    let prompt = DefaultPrompt::new(
        DefaultPromptSegment::Basic(question.to_string()),
        DefaultPromptSegment::Empty,
    );
    matches!(
        editor.read_line(&prompt),
        Ok(Signal::Success(answer)) if matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    )
}
