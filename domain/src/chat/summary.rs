//! Stored chats as listed and loaded from the backend

use crate::core::string::truncate_title;
use crate::session::entities::{ChatMessage, Role};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Title shown for chats that have none yet.
pub const UNTITLED_CHAT: &str = "New Chat";

/// One entry of the backend's chat list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSummary {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl ChatSummary {
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            UNTITLED_CHAT
        } else {
            &self.title
        }
    }

    /// Date of the last update, falling back to creation.
    pub fn last_activity(&self) -> Option<NaiveDate> {
        self.updated_at
            .as_deref()
            .and_then(parse_date)
            .or_else(|| self.created_at.as_deref().and_then(parse_date))
    }
}

/// A full stored chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRecord {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub model: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

/// Title for a conversation: its first user message, shortened.
pub fn derive_title(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .find(|m| m.role == Role::User)
        .map(|m| truncate_title(m.content.trim()))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNTITLED_CHAT.to_string())
}

/// Accepts RFC 3339 as well as the naive `YYYY-MM-DDTHH:MM:SS[.ffffff]`
/// timestamps the backend writes.
fn parse_date(s: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|dt| dt.date())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_title_displays_placeholder() {
        let summary: ChatSummary = serde_json::from_str(r#"{"id":"a"}"#).unwrap();
        assert_eq!(summary.display_title(), "New Chat");

        let summary: ChatSummary =
            serde_json::from_str(r#"{"id":"a","title":"Rust help"}"#).unwrap();
        assert_eq!(summary.display_title(), "Rust help");
    }

    #[test]
    fn last_activity_prefers_updated_at() {
        let summary: ChatSummary = serde_json::from_str(
            r#"{"id":"a","created_at":"2024-01-02T10:00:00","updated_at":"2024-03-04T08:30:00.123456"}"#,
        )
        .unwrap();
        assert_eq!(
            summary.last_activity(),
            NaiveDate::from_ymd_opt(2024, 3, 4)
        );
    }

    #[test]
    fn last_activity_falls_back_to_created_at() {
        let summary: ChatSummary = serde_json::from_str(
            r#"{"id":"a","created_at":"2024-01-02T10:00:00Z","updated_at":"garbage"}"#,
        )
        .unwrap();
        assert_eq!(
            summary.last_activity(),
            NaiveDate::from_ymd_opt(2024, 1, 2)
        );
    }

    #[test]
    fn record_deserializes_backend_shape() {
        let record: ChatRecord = serde_json::from_str(
            r#"{
                "id": "c1",
                "title": "Hello",
                "model": "llama2",
                "messages": [
                    {"role": "user", "content": "hi"},
                    {"role": "assistant", "content": "hello!"}
                ],
                "created_at": "2024-01-02T10:00:00"
            }"#,
        )
        .unwrap();
        assert_eq!(record.id, "c1");
        assert_eq!(record.model, "llama2");
        assert_eq!(record.messages.len(), 2);
        assert_eq!(record.messages[1].role, Role::Assistant);
    }

    #[test]
    fn title_from_first_user_message() {
        let messages = vec![
            ChatMessage::system("be nice"),
            ChatMessage::user("  How do lifetimes work?  "),
            ChatMessage::user("second"),
        ];
        assert_eq!(derive_title(&messages), "How do lifetimes work?");
    }

    #[test]
    fn title_without_user_message() {
        assert_eq!(derive_title(&[]), "New Chat");
        assert_eq!(derive_title(&[ChatMessage::assistant("hi")]), "New Chat");
    }
}
