//! Application layer for chatstream
//!
//! This crate contains use cases, port definitions, and the session store.
//! It depends only on the domain layer.

pub mod error;
pub mod ports;
pub mod session_store;
pub mod use_cases;

// Re-export commonly used types
pub use error::ChatError;
pub use ports::{
    chat_backend::{BackendError, ByteStream, ChatBackend},
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    stream_observer::{NoStreamObserver, StreamObserver},
};
pub use session_store::{SessionStore, StreamTicket};
pub use use_cases::manage_chats::{DeleteAllReport, FALLBACK_MODEL, ManageChatsUseCase};
pub use use_cases::send_message::{SendMessageInput, SendMessageUseCase, SendOutcome};
