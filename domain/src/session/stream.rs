//! Lifecycle of one streamed chat response.
//!
//! [`StreamSession`] is created when a send is initiated and dropped when the
//! stream terminates. It owns the frame decoder and the assistant text
//! accumulated so far, and walks through [`StreamPhase`]:
//!
//! ```text
//! Idle → Sending → Streaming → Completed
//!                            ↘ Failed
//! ```
//!
//! The session is pure logic: bytes go in through [`feed`](StreamSession::feed),
//! cumulative text comes out through a callback. Network I/O and write-back to
//! the conversation live in the application layer.

use super::frame::{FrameDecoder, FrameError, StreamFrame};
use super::request::ChatRequest;
use thiserror::Error;

/// Phase of a stream session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    /// No request in flight.
    Idle,
    /// Request issued, no response bytes yet.
    Sending,
    /// Response bytes are arriving.
    Streaming,
    /// Terminal: the full assistant text is available.
    Completed,
    /// Terminal: the stream failed; nothing is committed.
    Failed,
}

impl StreamPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamPhase::Completed | StreamPhase::Failed)
    }
}

impl std::fmt::Display for StreamPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StreamPhase::Idle => "idle",
            StreamPhase::Sending => "sending",
            StreamPhase::Streaming => "streaming",
            StreamPhase::Completed => "completed",
            StreamPhase::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Why a stream session failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamFailure {
    /// The server sent a frame with a truthy `error` field.
    #[error("{0}")]
    Server(String),

    /// A `data: ` line did not contain a JSON object.
    #[error(transparent)]
    Malformed(#[from] FrameError),

    /// The stream closed with no text and no terminal frame.
    #[error("No response received from the model")]
    Empty,

    /// Reading the response body failed.
    #[error("{0}")]
    Transport(String),
}

/// A successfully assembled assistant response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedStream {
    pub text: String,
    /// Conversation id assigned by the server on the terminal frame.
    pub chat_id: Option<String>,
    /// `false` when the server closed the connection without a `done` frame
    /// and the accumulated text was accepted as-is.
    pub explicit_done: bool,
}

/// One in-flight request and its streamed response.
#[derive(Debug)]
pub struct StreamSession {
    request: ChatRequest,
    decoder: FrameDecoder,
    accumulated_text: String,
    phase: StreamPhase,
    error: Option<StreamFailure>,
    chat_id: Option<String>,
    explicit_done: bool,
}

impl StreamSession {
    /// Start a session for a request that is about to be sent.
    pub fn new(request: ChatRequest) -> Self {
        Self {
            request,
            decoder: FrameDecoder::new(),
            accumulated_text: String::new(),
            phase: StreamPhase::Sending,
            error: None,
            chat_id: None,
            explicit_done: false,
        }
    }

    pub fn request(&self) -> &ChatRequest {
        &self.request
    }

    pub fn phase(&self) -> StreamPhase {
        self.phase
    }

    pub fn accumulated_text(&self) -> &str {
        &self.accumulated_text
    }

    pub fn is_complete(&self) -> bool {
        self.phase == StreamPhase::Completed
    }

    pub fn error(&self) -> Option<&StreamFailure> {
        self.error.as_ref()
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Feed one chunk of response bytes.
    ///
    /// `on_text` receives the cumulative assistant text after every frame
    /// that adds to it. Returns `true` once the session reached a terminal
    /// phase; further input is ignored.
    pub fn feed<F>(&mut self, chunk: &[u8], mut on_text: F) -> bool
    where
        F: FnMut(&str),
    {
        if self.is_terminal() {
            return true;
        }
        if !chunk.is_empty() && self.phase == StreamPhase::Sending {
            self.phase = StreamPhase::Streaming;
        }

        self.decoder.push(chunk);
        while let Some(frame) = self.decoder.next_frame() {
            self.apply(frame, &mut on_text);
            if self.is_terminal() {
                return true;
            }
        }
        false
    }

    /// Signal that the response body has no more bytes.
    ///
    /// A stream that ends without a terminal frame still completes when text
    /// was received; with no text it fails with [`StreamFailure::Empty`].
    pub fn finish<F>(&mut self, mut on_text: F)
    where
        F: FnMut(&str),
    {
        if self.is_terminal() {
            return;
        }
        if let Some(frame) = self.decoder.finish() {
            self.apply(frame, &mut on_text);
            if self.is_terminal() {
                return;
            }
        }

        if self.accumulated_text.is_empty() {
            self.fail(StreamFailure::Empty);
        } else {
            self.phase = StreamPhase::Completed;
        }
    }

    /// Abort the session because the body could not be read.
    pub fn abort(&mut self, reason: impl Into<String>) {
        if !self.is_terminal() {
            self.fail(StreamFailure::Transport(reason.into()));
        }
    }

    /// Consume the session into its final result.
    ///
    /// A session that never reached a terminal phase is treated as ended
    /// by the transport and finished first.
    pub fn into_result(mut self) -> Result<CompletedStream, StreamFailure> {
        if !self.is_terminal() {
            self.finish(|_| {});
        }
        match self.error {
            Some(failure) => Err(failure),
            None => Ok(CompletedStream {
                text: self.accumulated_text,
                chat_id: self.chat_id,
                explicit_done: self.explicit_done,
            }),
        }
    }

    fn apply<F>(&mut self, frame: Result<StreamFrame, FrameError>, on_text: &mut F)
    where
        F: FnMut(&str),
    {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                self.fail(StreamFailure::Malformed(e));
                return;
            }
        };

        if let Some(message) = frame.error_message() {
            self.fail(StreamFailure::Server(message));
            return;
        }

        if let Some(text) = frame.text()
            && !text.is_empty()
        {
            self.accumulated_text.push_str(text);
            on_text(&self.accumulated_text);
        }

        if frame.is_done() {
            self.chat_id = frame.chat_id().map(str::to_string);
            self.explicit_done = true;
            self.phase = StreamPhase::Completed;
        }
    }

    fn fail(&mut self, failure: StreamFailure) {
        self.error = Some(failure);
        self.phase = StreamPhase::Failed;
    }
}
