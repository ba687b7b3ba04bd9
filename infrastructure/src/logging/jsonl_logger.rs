//! JSONL file writer for conversation events.
//!
//! Every [`ConversationEvent`] becomes one JSON object per line: its own
//! tagged fields plus a `timestamp`. The file is opened in append mode so
//! one log can span several sessions.

use chatstream_application::ports::conversation_logger::{ConversationEvent, ConversationLogger};
use chatstream_domain::now_timestamp;
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Conversation logger writing JSON lines to a file.
pub struct JsonlConversationLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlConversationLogger {
    /// Open (or create) the log at `path`, creating parent directories.
    ///
    /// Returns `None` when the file cannot be opened; chatting goes on
    /// without a conversation log in that case.
    pub fn open(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create conversation log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!(
                    "Could not open conversation log {}: {}",
                    path.display(),
                    e
                );
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn to_record(event: &ConversationEvent) -> Option<Value> {
    let mut record = serde_json::to_value(event).ok()?;
    record
        .as_object_mut()?
        .insert("timestamp".to_string(), Value::String(now_timestamp()));
    Some(record)
}

impl ConversationLogger for JsonlConversationLogger {
    fn log(&self, event: ConversationEvent) {
        let Some(record) = to_record(&event) else {
            warn!("Unloggable {} event", event.event_type());
            return;
        };
        let line = record.to_string();

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            // One flush per event: a crash mid-chat keeps every finished turn.
            let _ = writer.flush();
        }
    }
}

impl Drop for JsonlConversationLogger {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}
