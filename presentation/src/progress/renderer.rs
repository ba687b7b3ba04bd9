//! Terminal rendering of a streamed reply

use chatstream_application::{ChatError, StreamObserver};
use chatstream_domain::StreamPhase;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

struct RenderState {
    out: Box<dyn Write + Send>,
    spinner: Option<ProgressBar>,
    /// Bytes of the cumulative text already on screen.
    printed: usize,
}

/// Renders one reply at a time into a terminal.
///
/// A spinner covers the wait for the first token. Because a terminal cannot
/// redraw the assistant bubble, each cumulative update prints only the part
/// not yet on screen.
pub struct TerminalRenderer {
    state: Mutex<RenderState>,
    show_progress: bool,
}

impl TerminalRenderer {
    /// Renderer writing to stdout.
    pub fn new(show_progress: bool) -> Self {
        Self::with_writer(Box::new(std::io::stdout()), show_progress)
    }

    pub fn with_writer(out: Box<dyn Write + Send>, show_progress: bool) -> Self {
        Self {
            state: Mutex::new(RenderState {
                out,
                spinner: None,
                printed: 0,
            }),
            show_progress,
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RenderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RenderState {
    fn clear_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

impl StreamObserver for TerminalRenderer {
    fn on_phase(&self, phase: StreamPhase) {
        let mut state = self.lock();
        match phase {
            StreamPhase::Sending => {
                state.printed = 0;
                if self.show_progress {
                    let spinner = ProgressBar::new_spinner();
                    spinner.set_style(Self::spinner_style());
                    spinner.set_message("Thinking...".dimmed().to_string());
                    spinner.enable_steady_tick(Duration::from_millis(100));
                    state.spinner = Some(spinner);
                }
            }
            StreamPhase::Completed | StreamPhase::Failed | StreamPhase::Idle => {
                state.clear_spinner();
            }
            StreamPhase::Streaming => {}
        }
    }

    fn on_partial_text(&self, cumulative_text: &str) {
        let mut state = self.lock();
        state.clear_spinner();

        let Some(delta) = cumulative_text.get(state.printed..) else {
            return;
        };
        if delta.is_empty() {
            return;
        }
        let _ = write!(state.out, "{}", delta);
        let _ = state.out.flush();
        state.printed = cumulative_text.len();
    }

    fn on_complete(&self, final_text: &str, new_chat_id: Option<&str>) {
        let mut state = self.lock();
        state.clear_spinner();

        if let Some(rest) = final_text.get(state.printed..) {
            let _ = write!(state.out, "{}", rest);
        }
        let _ = writeln!(state.out);
        if let Some(chat_id) = new_chat_id {
            let _ = writeln!(state.out, "{}", format!("(saved as chat {})", chat_id).dimmed());
        }
        let _ = state.out.flush();
        state.printed = 0;
    }

    fn on_discarded(&self, _final_text: &str) {
        let mut state = self.lock();
        state.clear_spinner();

        if state.printed > 0 {
            let _ = writeln!(state.out);
        }
        let _ = writeln!(
            state.out,
            "{}",
            "(reply discarded: the conversation was switched)".dimmed()
        );
        let _ = state.out.flush();
        state.printed = 0;
    }

    fn on_error(&self, error: &ChatError) {
        let mut state = self.lock();
        state.clear_spinner();

        if state.printed > 0 {
            let _ = writeln!(state.out);
        }
        let _ = writeln!(state.out, "{} {}", "Error:".red().bold(), error);
        let _ = state.out.flush();
        state.printed = 0;
    }
}
