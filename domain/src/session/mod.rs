//! Conversation and streaming domain.
//!
//! - [`entities::ChatMessage`]: one committed turn
//! - [`entities::ConversationState`]: transcript plus active chat/model identity
//! - [`request::ChatRequest`]: outbound streaming request payload
//! - [`frame::FrameDecoder`]: carry-over line buffer for `data: ` frames
//! - [`stream::StreamSession`]: state machine for one streamed response

pub mod entities;
pub mod frame;
pub mod request;
pub mod stream;
