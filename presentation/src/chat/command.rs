//! Slash commands of the interactive chat

/// A parsed REPL input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// Plain text to send as a message.
    Message(String),
    Help,
    Quit,
    NewChat,
    ListChats,
    LoadChat(String),
    DeleteChat(String),
    DeleteAllChats,
    ListModels,
    /// `/model` alone shows the current model; with an argument selects it.
    Model(Option<String>),
    ShowHistory,
    /// A slash command that needs an argument but got none.
    MissingArgument(&'static str),
    Unknown(String),
}

impl ReplCommand {
    /// Parse one input line. Returns `None` for blank input.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        if !line.starts_with('/') {
            return Some(ReplCommand::Message(line.to_string()));
        }

        let (name, arg) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, Some(rest.trim()).filter(|s| !s.is_empty())),
            None => (line, None),
        };

        let command = match name {
            "/help" | "/h" | "/?" => ReplCommand::Help,
            "/quit" | "/exit" | "/q" => ReplCommand::Quit,
            "/new" => ReplCommand::NewChat,
            "/chats" | "/list" => ReplCommand::ListChats,
            "/load" | "/open" => match arg {
                Some(id) => ReplCommand::LoadChat(id.to_string()),
                None => ReplCommand::MissingArgument("/load <chat-id>"),
            },
            "/delete" | "/rm" => match arg {
                Some(id) => ReplCommand::DeleteChat(id.to_string()),
                None => ReplCommand::MissingArgument("/delete <chat-id>"),
            },
            "/delete-all" => ReplCommand::DeleteAllChats,
            "/models" => ReplCommand::ListModels,
            "/model" => ReplCommand::Model(arg.map(str::to_string)),
            "/history" => ReplCommand::ShowHistory,
            other => ReplCommand::Unknown(other.to_string()),
        };
        Some(command)
    }
}

pub const HELP: &str = "\
Commands:
  /help, /h, /?        - Show this help
  /new                 - Start a new chat
  /chats               - List saved chats
  /load <chat-id>      - Continue a saved chat
  /delete <chat-id>    - Delete a saved chat
  /delete-all          - Delete every saved chat
  /models              - List available models
  /model [name]        - Show or switch the model
  /history             - Show the current conversation
  /quit, /exit, /q     - Exit chat";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_lines_are_skipped() {
        assert_eq!(ReplCommand::parse(""), None);
        assert_eq!(ReplCommand::parse("   \t"), None);
    }

    #[test]
    fn test_plain_text_is_a_message() {
        assert_eq!(
            ReplCommand::parse("  what is a monad? "),
            Some(ReplCommand::Message("what is a monad?".to_string()))
        );
    }

    #[test]
    fn test_commands_with_arguments() {
        assert_eq!(
            ReplCommand::parse("/load  abc-123 "),
            Some(ReplCommand::LoadChat("abc-123".to_string()))
        );
        assert_eq!(
            ReplCommand::parse("/model mistral"),
            Some(ReplCommand::Model(Some("mistral".to_string())))
        );
        assert_eq!(ReplCommand::parse("/model"), Some(ReplCommand::Model(None)));
    }

    #[test]
    fn test_missing_argument() {
        assert_eq!(
            ReplCommand::parse("/delete"),
            Some(ReplCommand::MissingArgument("/delete <chat-id>"))
        );
    }

    #[test]
    fn test_aliases_and_unknown() {
        assert_eq!(ReplCommand::parse("/q"), Some(ReplCommand::Quit));
        assert_eq!(ReplCommand::parse("/list"), Some(ReplCommand::ListChats));
        assert_eq!(
            ReplCommand::parse("/frobnicate now"),
            Some(ReplCommand::Unknown("/frobnicate".to_string()))
        );
    }
}
