//! Send Message use case.
//!
//! Drives one chat turn end to end: the stream assembler.
//!
//! ```text
//! begin_send ──► open_chat_stream ──► feed chunks ──► commit_assistant_for
//!  (slot +         (Sending)           (Streaming,     (Completed, only if
//!   user turn)                          partial text)   epoch is current)
//! ```
//!
//! Partial text only ever reaches the [`StreamObserver`]; the store sees
//! the final text once, after the stream completed.

use crate::error::ChatError;
use crate::ports::chat_backend::ChatBackend;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::stream_observer::StreamObserver;
use crate::session_store::{SessionStore, StreamTicket};
use chatstream_domain::{StreamPhase, StreamSession, truncate_str};
use futures::StreamExt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Input for the [`SendMessageUseCase`].
#[derive(Debug, Clone)]
pub struct SendMessageInput {
    /// Raw user input; trimmed and validated before sending.
    pub content: String,
    /// Model to switch to before sending. `None` keeps the current one.
    pub model: Option<String>,
}

impl SendMessageInput {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Result of a completed turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendOutcome {
    /// Final assistant text.
    pub text: String,
    /// Conversation id assigned by the server, for a chat that had none.
    pub chat_id: Option<String>,
    /// `false` when the conversation was replaced mid-stream and the
    /// completion was discarded.
    pub committed: bool,
    /// `false` when the server closed the stream without a terminal frame.
    pub explicit_done: bool,
}

/// Use case for sending one message and assembling the streamed reply.
#[derive(Clone)]
pub struct SendMessageUseCase {
    backend: Arc<dyn ChatBackend>,
    store: SessionStore,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl SendMessageUseCase {
    pub fn new(backend: Arc<dyn ChatBackend>, store: SessionStore) -> Self {
        Self {
            backend,
            store,
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    /// Create with a conversation logger.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Send `input` and stream the reply through `observer`.
    ///
    /// Local rejections ([`ChatError::ConcurrentRequest`],
    /// [`ChatError::Validation`]) return without touching the observer.
    /// Once the request is on its way, the observer receives exactly one of
    /// `on_complete` / `on_discarded` / `on_error`, followed by a final
    /// `Idle` phase.
    pub async fn execute(
        &self,
        input: SendMessageInput,
        observer: &dyn StreamObserver,
    ) -> Result<SendOutcome, ChatError> {
        let (ticket, request) = self
            .store
            .begin_send(&input.content, input.model.as_deref())?;

        info!(
            "Sending message to {} ({} turns): {}",
            request.model,
            request.messages.len(),
            truncate_str(&input.content, 100)
        );
        if let Some(user_turn) = request.messages.last() {
            self.conversation_logger.log(ConversationEvent::UserMessage {
                model: request.model.clone(),
                chat_id: request.chat_id().map(str::to_string),
                content: user_turn.content.clone(),
            });
        }

        let mut session = StreamSession::new(request);
        observer.on_phase(StreamPhase::Sending);

        self.read_stream(&mut session, observer).await;

        let model = session.request().model.clone();
        let result = match session.into_result() {
            Ok(completed) => {
                let outcome = self.complete(&ticket, completed, &model);
                observer.on_phase(StreamPhase::Completed);
                if outcome.committed {
                    observer.on_complete(&outcome.text, outcome.chat_id.as_deref());
                } else {
                    observer.on_discarded(&outcome.text);
                }
                Ok(outcome)
            }
            Err(failure) => {
                let error = ChatError::from(failure);
                warn!("Stream failed ({}): {}", error.kind(), error);
                self.conversation_logger.log(ConversationEvent::StreamError {
                    model,
                    kind: error.kind(),
                    message: error.to_string(),
                });
                observer.on_phase(StreamPhase::Failed);
                observer.on_error(&error);
                Err(error)
            }
        };

        self.store.finish_stream(ticket);
        observer.on_phase(StreamPhase::Idle);
        result
    }

    /// Open the request and pump body chunks into `session` until it is
    /// terminal or the body ends.
    async fn read_stream(&self, session: &mut StreamSession, observer: &dyn StreamObserver) {
        let mut body = match self.backend.open_chat_stream(session.request()).await {
            Ok(body) => body,
            Err(e) => {
                session.abort(e.to_string());
                return;
            }
        };

        while let Some(chunk) = body.next().await {
            let bytes = match chunk {
                Ok(bytes) => bytes,
                Err(e) => {
                    session.abort(e.to_string());
                    return;
                }
            };

            if !bytes.is_empty() && session.phase() == StreamPhase::Sending {
                observer.on_phase(StreamPhase::Streaming);
            }
            debug!("Received {} bytes", bytes.len());

            if session.feed(&bytes, |text| observer.on_partial_text(text)) {
                return;
            }
        }

        session.finish(|text| observer.on_partial_text(text));
    }

    fn complete(
        &self,
        ticket: &StreamTicket,
        completed: chatstream_domain::CompletedStream,
        model: &str,
    ) -> SendOutcome {
        if !completed.explicit_done {
            warn!("Stream ended without a terminal frame; accepting received text");
        }

        let committed = self.store.commit_assistant_for(ticket, completed.text.clone());
        if committed {
            if let Some(chat_id) = completed.chat_id.as_deref() {
                self.store.assign_chat_id_for(ticket, chat_id);
            }
            info!("Assistant reply committed ({} bytes)", completed.text.len());
            self.conversation_logger.log(ConversationEvent::AssistantMessage {
                model: model.to_string(),
                chat_id: completed.chat_id.clone(),
                content: completed.text.clone(),
            });
        } else {
            info!("Conversation changed mid-stream; reply discarded");
            self.conversation_logger.log(ConversationEvent::StreamDiscarded {
                model: model.to_string(),
                bytes: completed.text.len(),
            });
        }

        SendOutcome {
            text: completed.text,
            chat_id: completed.chat_id,
            committed,
            explicit_done: completed.explicit_done,
        }
    }
}
