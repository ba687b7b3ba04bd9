//! Chat history and model catalog as exposed by the backend.
//!
//! - [`summary::ChatSummary`]: one entry of the chat list
//! - [`summary::ChatRecord`]: a full stored chat, used to replace the active conversation
//! - [`catalog::ModelCatalog`]: models the backend can serve

pub mod catalog;
pub mod summary;
