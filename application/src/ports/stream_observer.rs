//! Stream observer port
//!
//! The render layer's view of a streamed response. The send use case calls
//! these hooks; it never renders anything itself.

use crate::error::ChatError;
use chatstream_domain::StreamPhase;

/// Callbacks for one stream session.
///
/// Per session, exactly one of [`on_complete`](Self::on_complete),
/// [`on_discarded`](Self::on_discarded) or [`on_error`](Self::on_error) is
/// invoked. Errors raised before a session exists (validation, concurrent
/// send) are only returned to the caller.
pub trait StreamObserver: Send + Sync {
    /// Called on every phase transition, ending with `Idle`.
    fn on_phase(&self, _phase: StreamPhase) {}

    /// Called with the full assistant text received so far.
    ///
    /// Renders replace the assistant bubble rather than append to it.
    fn on_partial_text(&self, cumulative_text: &str);

    /// Called once with the final text and, for a new chat, its assigned id.
    fn on_complete(&self, final_text: &str, new_chat_id: Option<&str>);

    /// Called instead of `on_complete` when the reply finished after its
    /// conversation was replaced. Nothing was stored; drop what was shown.
    fn on_discarded(&self, _final_text: &str) {}

    /// Called once when the session failed.
    fn on_error(&self, error: &ChatError);
}

/// No-op observer for callers that only need the returned outcome
pub struct NoStreamObserver;

impl StreamObserver for NoStreamObserver {
    fn on_partial_text(&self, _cumulative_text: &str) {}
    fn on_complete(&self, _final_text: &str, _new_chat_id: Option<&str>) {}
    fn on_error(&self, _error: &ChatError) {}
}
