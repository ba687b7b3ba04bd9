//! Application error taxonomy
//!
//! Every failure a chat operation can surface to the caller. All variants
//! carry a human-readable message through `Display`.

use crate::ports::chat_backend::BackendError;
use chatstream_domain::{DomainError, StreamFailure};
use thiserror::Error;

/// Errors surfaced by chat use cases.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// Local input rejected before anything was sent.
    #[error("{0}")]
    Validation(String),

    /// Transport or HTTP failure talking to the backend.
    #[error("{0}")]
    Request(String),

    /// Malformed frame or an explicit error sent by the server mid-stream.
    #[error("{0}")]
    Stream(String),

    /// The stream closed without content and without a terminal frame.
    #[error("No response received from the model")]
    EmptyResponse,

    /// A send was attempted while another one is still in flight.
    #[error("A response is already being streamed for this conversation")]
    ConcurrentRequest,
}

impl ChatError {
    /// Short category label, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ChatError::Validation(_) => "validation",
            ChatError::Request(_) => "request",
            ChatError::Stream(_) => "stream",
            ChatError::EmptyResponse => "empty_response",
            ChatError::ConcurrentRequest => "concurrent_request",
        }
    }

    /// Errors raised locally, before a request reached the backend.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ChatError::Validation(_) | ChatError::ConcurrentRequest
        )
    }
}

impl From<DomainError> for ChatError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation(msg) => ChatError::Validation(msg),
        }
    }
}

impl From<BackendError> for ChatError {
    fn from(e: BackendError) -> Self {
        ChatError::Request(e.to_string())
    }
}

impl From<StreamFailure> for ChatError {
    fn from(failure: StreamFailure) -> Self {
        match failure {
            StreamFailure::Server(msg) => ChatError::Stream(msg),
            StreamFailure::Malformed(e) => ChatError::Stream(e.to_string()),
            StreamFailure::Empty => ChatError::EmptyResponse,
            StreamFailure::Transport(msg) => ChatError::Request(msg),
        }
    }
}
