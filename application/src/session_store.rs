//! Session state store
//!
//! [`SessionStore`] owns the [`ConversationState`] of the open chat view and
//! routes every mutation through its methods. It also enforces the single
//! in-flight stream per conversation:
//!
//! - [`begin_send`](SessionStore::begin_send) claims the slot and hands out a
//!   [`StreamTicket`] stamped with the current **epoch**
//! - switching conversations bumps the epoch and frees the slot, so the old
//!   stream's eventual write-back is discarded instead of landing in the new
//!   transcript
//! - dropping the ticket releases the slot

use crate::error::ChatError;
use chatstream_domain::{ChatMessage, ChatRequest, ConversationState};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

#[derive(Debug)]
struct StoreInner {
    state: ConversationState,
    epoch: u64,
    in_flight: Option<u64>,
    next_ticket: u64,
}

impl StoreInner {
    fn claim(&mut self) -> Result<(u64, u64), ChatError> {
        if self.in_flight.is_some() {
            return Err(ChatError::ConcurrentRequest);
        }
        self.next_ticket += 1;
        self.in_flight = Some(self.next_ticket);
        Ok((self.next_ticket, self.epoch))
    }

    fn reset(&mut self, state: ConversationState) {
        self.state = state;
        self.epoch += 1;
        self.in_flight = None;
    }
}

/// Shared handle to the conversation state.
///
/// Cloning is cheap; clones observe the same state.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl SessionStore {
    /// Create a store with an empty conversation for `model_id`.
    pub fn new(model_id: impl Into<String>) -> Self {
        Self::with_state(ConversationState::new(model_id))
    }

    pub fn with_state(state: ConversationState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                state,
                epoch: 0,
                in_flight: None,
                next_ticket: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a user turn. Returns the new transcript length.
    pub fn append_user_message(&self, content: &str) -> Result<usize, ChatError> {
        let message = ChatMessage::user_input(content)?;
        let mut inner = self.lock();
        inner.state.transcript.push(message);
        Ok(inner.state.transcript.len())
    }

    /// Append a completed assistant turn. Returns the new transcript length.
    ///
    /// `content` must be the final text; partial stream text never goes here.
    pub fn commit_assistant_message(&self, content: impl Into<String>) -> usize {
        let mut inner = self.lock();
        inner.state.transcript.push(ChatMessage::assistant(content));
        inner.state.transcript.len()
    }

    /// Swap the whole conversation, e.g. when another chat is loaded.
    ///
    /// Any stream in flight for the previous conversation is abandoned.
    pub fn replace_conversation(
        &self,
        chat_id: Option<String>,
        model_id: impl Into<String>,
        messages: Vec<ChatMessage>,
    ) {
        let state = ConversationState {
            chat_id,
            model_id: model_id.into(),
            transcript: messages,
        };
        let mut inner = self.lock();
        if inner.in_flight.is_some() {
            debug!("Abandoning in-flight stream (epoch {})", inner.epoch);
        }
        inner.reset(state);
    }

    /// Start an empty chat, keeping the selected model.
    pub fn start_new_chat(&self) {
        self.start_chat(None);
    }

    /// Start an empty chat the server already created as `chat_id`.
    pub fn start_created_chat(&self, chat_id: impl Into<String>) {
        self.start_chat(Some(chat_id.into()));
    }

    fn start_chat(&self, chat_id: Option<String>) {
        let mut inner = self.lock();
        let model_id = std::mem::take(&mut inner.state.model_id);
        let mut state = ConversationState::new(model_id);
        state.chat_id = chat_id;
        inner.reset(state);
    }

    /// Snapshot of the current conversation.
    pub fn current_state(&self) -> ConversationState {
        self.lock().state.clone()
    }

    pub fn chat_id(&self) -> Option<String> {
        self.lock().state.chat_id.clone()
    }

    pub fn model_id(&self) -> String {
        self.lock().state.model_id.clone()
    }

    /// Select the model used for the next request.
    pub fn set_model(&self, model_id: impl Into<String>) {
        self.lock().state.model_id = model_id.into();
    }

    pub fn epoch(&self) -> u64 {
        self.lock().epoch
    }

    /// Whether a stream currently holds the in-flight slot.
    pub fn is_streaming(&self) -> bool {
        self.lock().in_flight.is_some()
    }

    /// Claim the in-flight slot without touching the transcript.
    pub fn begin_stream(&self) -> Result<StreamTicket, ChatError> {
        let (id, epoch) = self.lock().claim()?;
        Ok(StreamTicket {
            id,
            epoch,
            inner: Arc::clone(&self.inner),
        })
    }

    /// Atomically claim the slot, select `model` (if given), append the user
    /// turn and build the outbound request from the resulting transcript.
    ///
    /// Fails with [`ChatError::ConcurrentRequest`] when a stream is in
    /// flight, or [`ChatError::Validation`] for blank input. Either way the
    /// store is left untouched, model included.
    pub fn begin_send(
        &self,
        content: &str,
        model: Option<&str>,
    ) -> Result<(StreamTicket, ChatRequest), ChatError> {
        let mut inner = self.lock();
        if inner.in_flight.is_some() {
            return Err(ChatError::ConcurrentRequest);
        }
        let message = ChatMessage::user_input(content)?;
        let (id, epoch) = inner.claim()?;

        if let Some(model) = model {
            inner.state.model_id = model.to_string();
        }
        inner.state.transcript.push(message);
        let request = ChatRequest::streaming(
            inner.state.model_id.clone(),
            inner.state.transcript.clone(),
            inner.state.chat_id.clone(),
        );

        let ticket = StreamTicket {
            id,
            epoch,
            inner: Arc::clone(&self.inner),
        };
        Ok((ticket, request))
    }

    /// Commit the final assistant text for the stream holding `ticket`.
    ///
    /// Returns `false`, leaving the transcript untouched, if the conversation
    /// was replaced since the stream started.
    pub fn commit_assistant_for(&self, ticket: &StreamTicket, content: impl Into<String>) -> bool {
        let mut inner = self.lock();
        if inner.epoch != ticket.epoch {
            debug!(
                "Discarding stale completion (ticket epoch {}, current {})",
                ticket.epoch, inner.epoch
            );
            return false;
        }
        inner.state.transcript.push(ChatMessage::assistant(content));
        true
    }

    /// Record the server-assigned id of the conversation `ticket` belongs to.
    pub fn assign_chat_id_for(&self, ticket: &StreamTicket, chat_id: impl Into<String>) -> bool {
        let mut inner = self.lock();
        if inner.epoch != ticket.epoch {
            return false;
        }
        inner.state.chat_id = Some(chat_id.into());
        true
    }

    /// Release the in-flight slot held by `ticket`.
    pub fn finish_stream(&self, ticket: StreamTicket) {
        drop(ticket);
    }
}

/// Claim on the in-flight slot of a [`SessionStore`].
///
/// Released on drop. A ticket whose conversation was replaced no longer
/// owns the slot; dropping it is then a no-op.
#[derive(Debug)]
pub struct StreamTicket {
    id: u64,
    epoch: u64,
    inner: Arc<Mutex<StoreInner>>,
}

impl StreamTicket {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Whether the conversation this ticket was issued for is still active.
    pub fn is_current(&self) -> bool {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.epoch == self.epoch
    }
}

impl Drop for StreamTicket {
    fn drop(&mut self) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if inner.in_flight == Some(self.id) {
            inner.in_flight = None;
        }
    }
}
