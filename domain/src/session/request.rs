//! Outbound chat request payload

use super::entities::ChatMessage;
use serde::{Deserialize, Serialize};

/// Conversation identity sent alongside a request, and returned by the
/// backend on the terminal frame of a brand-new chat.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChatContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
}

/// Body of a streaming chat request.
///
/// `context` is omitted entirely when the conversation has no id yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ChatContext>,
}

impl ChatRequest {
    /// Build a streaming request for the given transcript.
    pub fn streaming(
        model: impl Into<String>,
        messages: Vec<ChatMessage>,
        chat_id: Option<String>,
    ) -> Self {
        Self {
            model: model.into(),
            messages,
            stream: true,
            context: chat_id.map(|id| ChatContext { chat_id: Some(id) }),
        }
    }

    pub fn chat_id(&self) -> Option<&str> {
        self.context.as_ref().and_then(|c| c.chat_id.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_chat_omits_context() {
        let request = ChatRequest::streaming("llama2", vec![ChatMessage::user("hi")], None);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "llama2");
        assert_eq!(value["stream"], true);
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "hi");
        assert!(value.get("context").is_none());
        assert_eq!(request.chat_id(), None);
    }

    #[test]
    fn existing_chat_carries_id() {
        let request = ChatRequest::streaming("llama2", vec![], Some("abc".to_string()));
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["context"]["chat_id"], "abc");
        assert_eq!(request.chat_id(), Some("abc"));
    }
}
