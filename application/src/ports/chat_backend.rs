//! Chat backend port
//!
//! Defines the interface for talking to the chat service: opening a
//! streamed chat request and managing stored chats.

use async_trait::async_trait;
use chatstream_domain::{ChatRecord, ChatRequest, ChatSummary, ModelCatalog};
use futures::stream::BoxStream;
use thiserror::Error;

/// Raw response body of a streamed chat request, chunk by chunk.
///
/// Chunks are whatever the transport delivered; they carry no relation to
/// frame or line boundaries.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, BackendError>>;

/// Errors that can occur during backend operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Connection error: {0}")]
    Connection(String),

    /// Non-2xx status. `message` is the server-provided reason.
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl BackendError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::Status { status: 404, .. })
    }
}

/// Gateway to the chat service
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Issue a streaming chat request.
    ///
    /// Resolves once the response head arrived with a success status;
    /// transport failures and error statuses are returned here, before any
    /// body bytes.
    async fn open_chat_stream(&self, request: &ChatRequest) -> Result<ByteStream, BackendError>;

    /// List stored chats.
    async fn list_chats(&self) -> Result<Vec<ChatSummary>, BackendError>;

    /// Create an empty stored chat and return its id.
    async fn create_chat(&self) -> Result<String, BackendError>;

    /// Fetch one stored chat with its messages.
    async fn load_chat(&self, chat_id: &str) -> Result<ChatRecord, BackendError>;

    /// Delete one stored chat.
    async fn delete_chat(&self, chat_id: &str) -> Result<(), BackendError>;

    /// Models the backend can serve.
    async fn list_models(&self) -> Result<ModelCatalog, BackendError>;

    /// The backend's configured default model, if any.
    async fn default_model(&self) -> Result<Option<String>, BackendError>;
}
