//! HTTP adapter for the chat service
//!
//! [`HttpChatBackend`] implements the
//! [`ChatBackend`](chatstream_application::ChatBackend) port with `reqwest`.
//! The streamed chat body is handed upward as raw chunks; framing is done by
//! the domain's frame decoder.

mod backend;
mod error_body;

pub use backend::HttpChatBackend;
pub use error_body::{GENERIC_SEND_FAILURE, extract_error_message};
