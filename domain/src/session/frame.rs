//! Incremental decoding of `data: <JSON>` stream frames.
//!
//! The backend answers a chat request with a body of newline-terminated
//! lines. A line starting with [`DATA_PREFIX`] carries one JSON frame; every
//! other line (blank keep-alives, comments) is skipped.
//!
//! Network reads do not line up with frame boundaries, so [`FrameDecoder`]
//! buffers raw bytes and only ever parses complete lines. The unterminated
//! tail of a read waits in the buffer for the next one, which also keeps
//! multi-byte UTF-8 characters intact when a read splits them.
//!
//! ```text
//! read 1: data: {"mess
//! read 2: age":"hi"}\n
//!         └────────────── one frame: {"message":"hi"}
//! ```

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Prefix marking a line as a frame.
pub const DATA_PREFIX: &str = "data: ";

/// A frame whose JSON payload could not be parsed.
///
/// The feed is assumed to be well-formed per frame, so this is fatal for the
/// whole stream rather than a skipped line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to parse stream frame: {error}")]
pub struct FrameError {
    pub error: String,
    pub raw: String,
}

/// One parsed frame.
///
/// Fields are kept as raw JSON because the backend is loose about types
/// (`done` may be `true` or `1`, `error` may be a string or an object).
/// Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StreamFrame {
    #[serde(default)]
    pub message: Option<Value>,
    #[serde(default)]
    pub done: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub context: Option<Value>,
}

impl StreamFrame {
    /// Error reported by the server, if the `error` field is truthy.
    pub fn error_message(&self) -> Option<String> {
        match self.error.as_ref()? {
            v if !is_truthy(v) => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// The text delta carried by this frame, if `message` is a string.
    pub fn text(&self) -> Option<&str> {
        self.message.as_ref().and_then(Value::as_str)
    }

    /// Whether this is the terminal frame.
    pub fn is_done(&self) -> bool {
        self.done.as_ref().is_some_and(is_truthy)
    }

    /// Conversation id assigned by the server (`context.chat_id`).
    pub fn chat_id(&self) -> Option<&str> {
        self.context
            .as_ref()?
            .get("chat_id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
    }
}

/// JSON truthiness as the backend's browser clients understand it.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Parse a single line (without its terminating newline).
///
/// Returns `None` for lines that are not frames.
pub fn parse_line(line: &[u8]) -> Option<Result<StreamFrame, FrameError>> {
    let text = String::from_utf8_lossy(line);
    let text = text.strip_suffix('\r').unwrap_or(&text);
    let payload = text.strip_prefix(DATA_PREFIX)?;

    Some(
        serde_json::from_str::<StreamFrame>(payload).map_err(|e| FrameError {
            error: e.to_string(),
            raw: payload.to_string(),
        }),
    )
}

/// Carry-over line buffer turning byte chunks into frames.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    /// Bytes of `buffer` already known to contain no newline.
    scanned: usize,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk read from the network.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Next frame from the complete lines buffered so far.
    ///
    /// Returns `None` once only a partial line (or nothing) remains.
    pub fn next_frame(&mut self) -> Option<Result<StreamFrame, FrameError>> {
        loop {
            let offset = self.buffer[self.scanned..]
                .iter()
                .position(|&b| b == b'\n');

            let Some(offset) = offset else {
                self.scanned = self.buffer.len();
                return None;
            };

            let end = self.scanned + offset;
            let line: Vec<u8> = self.buffer.drain(..=end).collect();
            self.scanned = 0;

            if let Some(frame) = parse_line(&line[..end]) {
                return Some(frame);
            }
        }
    }

    /// Flush the unterminated remainder once the stream has ended.
    pub fn finish(&mut self) -> Option<Result<StreamFrame, FrameError>> {
        self.scanned = 0;
        if self.buffer.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.buffer);
        parse_line(&line)
    }

    /// Number of buffered bytes not yet forming a complete line.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}
