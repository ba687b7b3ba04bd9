//! Transcript log port
//!
//! Each chat turn and each stream that ends without a stored reply is
//! reported as a [`ConversationEvent`]. `tracing` covers diagnostics; this
//! port is the durable record of what was said, per model and chat.

use serde::Serialize;

/// Something worth keeping from a chat turn.
///
/// Serializes as a flat object tagged with `type`, e.g.
/// `{"type":"user_message","model":"llama2","chat_id":null,"content":"hi"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversationEvent {
    /// The user turn as sent, with the chat it belongs to (if known yet).
    UserMessage {
        model: String,
        chat_id: Option<String>,
        content: String,
    },
    /// A reply that was committed to the transcript. `chat_id` is set when
    /// the server assigned one with this reply.
    AssistantMessage {
        model: String,
        chat_id: Option<String>,
        content: String,
    },
    StreamError {
        model: String,
        kind: &'static str,
        message: String,
    },
    /// A reply finished after its conversation was replaced.
    StreamDiscarded { model: String, bytes: usize },
}

impl ConversationEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            ConversationEvent::UserMessage { .. } => "user_message",
            ConversationEvent::AssistantMessage { .. } => "assistant_message",
            ConversationEvent::StreamError { .. } => "stream_error",
            ConversationEvent::StreamDiscarded { .. } => "stream_discarded",
        }
    }
}

/// Sink for [`ConversationEvent`]s.
///
/// Infallible: a sink that cannot write drops the event and the chat goes on.
pub trait ConversationLogger: Send + Sync {
    fn log(&self, event: ConversationEvent);
}

/// Used when no transcript log is configured.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_flat_with_type_tag() {
        let event = ConversationEvent::StreamError {
            model: "llama2".to_string(),
            kind: "stream",
            message: "boom".to_string(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "type": "stream_error",
                "model": "llama2",
                "kind": "stream",
                "message": "boom",
            })
        );
        assert_eq!(value["type"], event.event_type());
    }
}
