//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod manage_chats;
pub mod send_message;
