//! Domain layer for chatstream
//!
//! This crate contains the conversation entities and the pure logic of
//! streamed chat responses. It has no dependencies on infrastructure or
//! presentation concerns.
//!
//! # Core Concepts
//!
//! ## Conversation
//!
//! A [`ConversationState`] is the transcript of committed turns plus the
//! identity of the active chat and model. Text that is still streaming is
//! never part of it.
//!
//! ## Stream Session
//!
//! A [`StreamSession`] assembles one streamed response from raw bytes:
//!
//! - **Frames**: `data: <JSON>` lines, decoded by [`FrameDecoder`] with a
//!   carry-over buffer so chunk boundaries never split a frame
//! - **Phases**: `Idle → Sending → Streaming → Completed | Failed`

pub mod chat;
pub mod core;
pub mod session;

// Re-export commonly used types
pub use chat::{
    catalog::ModelCatalog,
    summary::{ChatRecord, ChatSummary, UNTITLED_CHAT, derive_title},
};
pub use core::{
    error::DomainError,
    string::{truncate_str, truncate_title},
};
pub use session::{
    entities::{ChatMessage, ConversationState, Role, now_timestamp},
    frame::{DATA_PREFIX, FrameDecoder, FrameError, StreamFrame},
    request::{ChatContext, ChatRequest},
    stream::{CompletedStream, StreamFailure, StreamPhase, StreamSession},
};
