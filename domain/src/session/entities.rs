//! Conversation domain entities

use crate::core::error::DomainError;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        write!(f, "{}", s)
    }
}

/// A committed turn in a conversation (Entity)
///
/// Messages are immutable once appended to a transcript. Messages loaded
/// from the backend's chat history may lack a timestamp; they deserialize
/// with an empty one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub timestamp: String,
}

impl ChatMessage {
    /// Create a message stamped with the current UTC time.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: now_timestamp(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Validate raw user input and build a user turn from it.
    ///
    /// Input that is empty after trimming is rejected; accepted input is
    /// stored trimmed.
    pub fn user_input(content: &str) -> Result<Self, DomainError> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(DomainError::Validation(
                "message cannot be empty".to_string(),
            ));
        }
        Ok(Self::user(trimmed))
    }
}

/// Current UTC time as an ISO-8601 string with millisecond precision.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// The state of one open chat view.
///
/// `transcript` holds only complete turns in append order; text that is
/// still streaming never lands here.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConversationState {
    pub chat_id: Option<String>,
    pub model_id: String,
    pub transcript: Vec<ChatMessage>,
}

impl ConversationState {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            chat_id: None,
            model_id: model_id.into(),
            transcript: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.transcript.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transcript.is_empty()
    }

    /// The most recent turn, if any.
    pub fn last(&self) -> Option<&ChatMessage> {
        self.transcript.last()
    }
}
