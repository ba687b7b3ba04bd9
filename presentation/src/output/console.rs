//! Console output formatter for chats, models and transcripts

use colored::Colorize;
use chatstream_domain::{ChatMessage, ChatSummary, ModelCatalog, Role};

/// Formats backend data for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// One line per chat: date, id, title, model.
    pub fn format_chat_list(chats: &[ChatSummary], active_chat: Option<&str>) -> String {
        if chats.is_empty() {
            return format!("{}\n", "No saved chats.".dimmed());
        }

        let mut output = String::new();
        for chat in chats {
            let marker = if active_chat == Some(chat.id.as_str()) {
                "*".green().bold().to_string()
            } else {
                " ".to_string()
            };
            let date = chat
                .last_activity()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "----------".to_string());
            let model = chat
                .model
                .as_deref()
                .map(|m| format!(" ({})", m).dimmed().to_string())
                .unwrap_or_default();

            output.push_str(&format!(
                "{} {} {}  {}{}\n",
                marker,
                date.dimmed(),
                chat.id.yellow(),
                chat.display_title(),
                model
            ));
        }
        output
    }

    /// Models with the current one marked.
    pub fn format_models(catalog: &ModelCatalog, current: &str) -> String {
        if catalog.is_empty() {
            return format!("{}\n", "The backend reported no models.".dimmed());
        }

        let mut output = String::new();
        for model in &catalog.models {
            let mut line = if model == current {
                format!("  {} {}", "*".green().bold(), model.bold())
            } else {
                format!("    {}", model)
            };
            if catalog.default_model.as_deref() == Some(model.as_str()) {
                line.push_str(&format!(" {}", "(default)".dimmed()));
            }
            output.push_str(&line);
            output.push('\n');
        }
        output
    }

    /// Replay of a loaded conversation.
    pub fn format_transcript(messages: &[ChatMessage]) -> String {
        let mut output = String::new();
        for message in messages {
            let label = Self::role_label(message.role);
            output.push_str(&format!("{} {}\n\n", label, message.content));
        }
        output
    }

    pub fn role_label(role: Role) -> String {
        match role {
            Role::User => "You:".cyan().bold().to_string(),
            Role::Assistant => "Assistant:".green().bold().to_string(),
            Role::System => "System:".magenta().bold().to_string(),
        }
    }
}
