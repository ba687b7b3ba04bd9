//! Manage Chats use case.
//!
//! Stored chat history and model selection: listing, loading into the
//! session store, deleting, and discovering models.

use crate::error::ChatError;
use crate::ports::chat_backend::ChatBackend;
use crate::session_store::SessionStore;
use chatstream_domain::{ChatSummary, ConversationState, ModelCatalog};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Model used when neither configuration nor backend names one.
pub const FALLBACK_MODEL: &str = "llama2";

/// Result of [`ManageChatsUseCase::delete_all_chats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteAllReport {
    pub deleted: usize,
    pub failed: usize,
}

/// Use case for chat history and model discovery.
#[derive(Clone)]
pub struct ManageChatsUseCase {
    backend: Arc<dyn ChatBackend>,
    store: SessionStore,
}

impl ManageChatsUseCase {
    pub fn new(backend: Arc<dyn ChatBackend>, store: SessionStore) -> Self {
        Self { backend, store }
    }

    pub async fn list_chats(&self) -> Result<Vec<ChatSummary>, ChatError> {
        let chats = self.backend.list_chats().await?;
        debug!("Backend lists {} chats", chats.len());
        Ok(chats)
    }

    /// Fetch a stored chat and make it the active conversation.
    ///
    /// Any stream still running for the previous conversation is abandoned.
    pub async fn load_chat(&self, chat_id: &str) -> Result<ConversationState, ChatError> {
        let record = self.backend.load_chat(chat_id).await?;

        let model = if record.model.is_empty() {
            self.store.model_id()
        } else {
            record.model
        };
        info!(
            "Loaded chat {} ({} messages, model {})",
            record.id,
            record.messages.len(),
            model
        );
        self.store
            .replace_conversation(Some(record.id), model, record.messages);
        Ok(self.store.current_state())
    }

    /// Delete a stored chat. Clears the view when it was the active one.
    pub async fn delete_chat(&self, chat_id: &str) -> Result<(), ChatError> {
        self.backend.delete_chat(chat_id).await?;
        info!("Deleted chat {}", chat_id);
        self.clear_if_active(chat_id);
        Ok(())
    }

    /// Delete every listed chat, continuing past individual failures.
    pub async fn delete_all_chats(&self) -> Result<DeleteAllReport, ChatError> {
        let chats = self.backend.list_chats().await?;
        let mut report = DeleteAllReport::default();

        for chat in &chats {
            match self.backend.delete_chat(&chat.id).await {
                Ok(()) => {
                    report.deleted += 1;
                    self.clear_if_active(&chat.id);
                }
                Err(e) => {
                    warn!("Failed to delete chat {}: {}", chat.id, e);
                    report.failed += 1;
                }
            }
        }

        info!(
            "Deleted {} chats ({} failed)",
            report.deleted, report.failed
        );
        Ok(report)
    }

    pub async fn list_models(&self) -> Result<ModelCatalog, ChatError> {
        Ok(self.backend.list_models().await?)
    }

    pub async fn default_model(&self) -> Result<Option<String>, ChatError> {
        Ok(self.backend.default_model().await?)
    }

    /// Pick the model for a fresh session and select it in the store.
    ///
    /// Order: `configured`, the backend's default, [`FALLBACK_MODEL`]. An
    /// unreachable backend is not an error here.
    pub async fn resolve_model(&self, configured: Option<&str>) -> String {
        let model = match configured.filter(|m| !m.trim().is_empty()) {
            Some(model) => model.to_string(),
            None => match self.backend.default_model().await {
                Ok(Some(model)) if !model.is_empty() => model,
                Ok(_) => FALLBACK_MODEL.to_string(),
                Err(e) => {
                    warn!("Could not fetch default model: {}", e);
                    FALLBACK_MODEL.to_string()
                }
            },
        };
        self.store.set_model(model.as_str());
        model
    }

    /// Start an empty conversation, keeping the selected model.
    ///
    /// The chat is created on the server first so it is listed right away.
    /// When that fails it starts locally and gets its id with the first
    /// reply. Returns the server-assigned id, if any.
    pub async fn new_chat(&self) -> Option<String> {
        match self.backend.create_chat().await {
            Ok(chat_id) => {
                info!("Created chat {}", chat_id);
                self.store.start_created_chat(chat_id.as_str());
                Some(chat_id)
            }
            Err(e) => {
                warn!("Could not create chat on the server: {}", e);
                self.store.start_new_chat();
                None
            }
        }
    }

    fn clear_if_active(&self, chat_id: &str) {
        if self.store.chat_id().as_deref() == Some(chat_id) {
            debug!("Active chat {} deleted; starting a new one", chat_id);
            self.store.start_new_chat();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::chat_backend::{BackendError, ByteStream};
    use async_trait::async_trait;
    use chatstream_domain::{ChatMessage, ChatRecord, ChatRequest, Role};
    use std::collections::HashMap;
    use std::sync::Mutex;

    // ==================== Test Mocks ====================

    #[derive(Default)]
    struct InMemoryBackend {
        chats: Mutex<HashMap<String, ChatRecord>>,
        undeletable: Vec<String>,
        default_model: Option<String>,
        offline: bool,
    }

    impl InMemoryBackend {
        fn with_chat(self, id: &str, model: &str, messages: Vec<ChatMessage>) -> Self {
            self.chats.lock().unwrap().insert(
                id.to_string(),
                ChatRecord {
                    id: id.to_string(),
                    title: None,
                    model: model.to_string(),
                    messages,
                },
            );
            self
        }

        fn offline() -> Self {
            Self {
                offline: true,
                ..Self::default()
            }
        }

        fn check_online(&self) -> Result<(), BackendError> {
            if self.offline {
                return Err(BackendError::Connection("connection refused".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl ChatBackend for InMemoryBackend {
        async fn open_chat_stream(
            &self,
            _request: &ChatRequest,
        ) -> Result<ByteStream, BackendError> {
            Err(BackendError::Connection("not scripted".to_string()))
        }

        async fn list_chats(&self) -> Result<Vec<ChatSummary>, BackendError> {
            self.check_online()?;
            let mut ids: Vec<String> = self.chats.lock().unwrap().keys().cloned().collect();
            ids.sort();
            Ok(ids
                .into_iter()
                .map(|id| ChatSummary {
                    id,
                    title: String::new(),
                    model: None,
                    created_at: None,
                    updated_at: None,
                })
                .collect())
        }

        async fn create_chat(&self) -> Result<String, BackendError> {
            self.check_online()?;
            let mut chats = self.chats.lock().unwrap();
            let id = format!("new-{}", chats.len() + 1);
            chats.insert(
                id.clone(),
                ChatRecord {
                    id: id.clone(),
                    title: None,
                    model: String::new(),
                    messages: vec![],
                },
            );
            Ok(id)
        }

        async fn load_chat(&self, chat_id: &str) -> Result<ChatRecord, BackendError> {
            self.check_online()?;
            self.chats
                .lock()
                .unwrap()
                .get(chat_id)
                .cloned()
                .ok_or_else(|| BackendError::Status {
                    status: 404,
                    message: "Chat not found".to_string(),
                })
        }

        async fn delete_chat(&self, chat_id: &str) -> Result<(), BackendError> {
            self.check_online()?;
            if self.undeletable.iter().any(|id| id == chat_id) {
                return Err(BackendError::Status {
                    status: 500,
                    message: "disk full".to_string(),
                });
            }
            self.chats.lock().unwrap().remove(chat_id);
            Ok(())
        }

        async fn list_models(&self) -> Result<ModelCatalog, BackendError> {
            self.check_online()?;
            Ok(ModelCatalog {
                models: vec!["llama2".to_string(), "mistral".to_string()],
                default_model: self.default_model.clone(),
            })
        }

        async fn default_model(&self) -> Result<Option<String>, BackendError> {
            self.check_online()?;
            Ok(self.default_model.clone())
        }
    }

    fn use_case(backend: InMemoryBackend) -> ManageChatsUseCase {
        ManageChatsUseCase::new(Arc::new(backend), SessionStore::new("llama2"))
    }

    // ==================== Tests ====================

    #[tokio::test]
    async fn load_chat_replaces_conversation() {
        let backend = InMemoryBackend::default().with_chat(
            "c1",
            "mistral",
            vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")],
        );
        let uc = use_case(backend);
        let epoch = uc.store.epoch();

        let state = uc.load_chat("c1").await.unwrap();

        assert_eq!(state.chat_id.as_deref(), Some("c1"));
        assert_eq!(state.model_id, "mistral");
        assert_eq!(state.transcript[1].role, Role::Assistant);
        assert_eq!(uc.store.current_state(), state);
        assert!(uc.store.epoch() > epoch);
    }

    #[tokio::test]
    async fn load_missing_chat_is_request_error() {
        let uc = use_case(InMemoryBackend::default());
        uc.store.append_user_message("keep me").unwrap();

        let err = uc.load_chat("nope").await.unwrap_err();
        assert_eq!(err, ChatError::Request("Chat not found".to_string()));
        assert_eq!(uc.store.current_state().len(), 1);
    }

    #[tokio::test]
    async fn deleting_active_chat_clears_view() {
        let backend = InMemoryBackend::default()
            .with_chat("c1", "llama2", vec![ChatMessage::user("a")]);
        let uc = use_case(backend);
        uc.load_chat("c1").await.unwrap();

        uc.delete_chat("c1").await.unwrap();

        let state = uc.store.current_state();
        assert!(state.is_empty());
        assert_eq!(state.chat_id, None);
        assert!(uc.list_chats().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleting_other_chat_keeps_view() {
        let backend = InMemoryBackend::default()
            .with_chat("c1", "llama2", vec![ChatMessage::user("a")])
            .with_chat("c2", "llama2", vec![ChatMessage::user("b")]);
        let uc = use_case(backend);
        uc.load_chat("c1").await.unwrap();

        uc.delete_chat("c2").await.unwrap();
        assert_eq!(uc.store.chat_id().as_deref(), Some("c1"));
    }

    #[tokio::test]
    async fn delete_all_counts_failures() {
        let mut backend = InMemoryBackend::default()
            .with_chat("a", "llama2", vec![])
            .with_chat("b", "llama2", vec![])
            .with_chat("c", "llama2", vec![]);
        backend.undeletable = vec!["b".to_string()];
        let uc = use_case(backend);
        uc.load_chat("a").await.unwrap();

        let report = uc.delete_all_chats().await.unwrap();

        assert_eq!(report, DeleteAllReport { deleted: 2, failed: 1 });
        assert_eq!(uc.store.chat_id(), None);
        let remaining: Vec<String> = uc
            .list_chats()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(remaining, vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn delete_all_fails_when_listing_fails() {
        let uc = use_case(InMemoryBackend::offline());
        assert!(matches!(
            uc.delete_all_chats().await.unwrap_err(),
            ChatError::Request(_)
        ));
    }

    #[tokio::test]
    async fn resolve_model_prefers_configuration() {
        let backend = InMemoryBackend {
            default_model: Some("mistral".to_string()),
            ..InMemoryBackend::default()
        };
        let uc = use_case(backend);
        assert_eq!(uc.resolve_model(Some("phi3")).await, "phi3");
        assert_eq!(uc.store.model_id(), "phi3");
        assert_eq!(uc.resolve_model(None).await, "mistral");
        assert_eq!(uc.store.model_id(), "mistral");
    }

    #[tokio::test]
    async fn resolve_model_falls_back_when_offline() {
        let uc = use_case(InMemoryBackend::offline());
        assert_eq!(uc.resolve_model(Some("  ")).await, FALLBACK_MODEL);
    }

    #[tokio::test]
    async fn list_models_passes_catalog_through() {
        let uc = use_case(InMemoryBackend::default());
        let catalog = uc.list_models().await.unwrap();
        assert!(catalog.contains("mistral"));
        assert_eq!(uc.default_model().await.unwrap(), None);
    }

    #[tokio::test]
    async fn new_chat_is_created_on_server_and_listed() {
        let uc = use_case(InMemoryBackend::default());
        uc.store.set_model("mistral");
        uc.store.append_user_message("x").unwrap();

        let chat_id = uc.new_chat().await;

        assert_eq!(chat_id.as_deref(), Some("new-1"));
        let state = uc.store.current_state();
        assert!(state.is_empty());
        assert_eq!(state.chat_id.as_deref(), Some("new-1"));
        assert_eq!(state.model_id, "mistral");
        let listed: Vec<String> = uc
            .list_chats()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(listed, vec!["new-1".to_string()]);
    }

    #[tokio::test]
    async fn new_chat_starts_locally_when_offline() {
        let uc = use_case(InMemoryBackend::offline());
        uc.store
            .replace_conversation(Some("old".to_string()), "phi3", vec![ChatMessage::user("x")]);

        assert_eq!(uc.new_chat().await, None);

        let state = uc.store.current_state();
        assert!(state.is_empty());
        assert_eq!(state.chat_id, None);
        assert_eq!(state.model_id, "phi3");
    }
}
