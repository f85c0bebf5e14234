//! Editor state: the input buffer and the output panel.
//!
//! ```text
//! user ──set_input──▶ Editor ◀──set_output── WorkflowActor
//!                       │
//!                       └──EditorEvent──▶ subscribers (CLI status, tests)
//! ```
//!
//! The input is plain text the user replaces at will. The output is an
//! [`OutputState`] only the workflow actor writes, tagged with the
//! generation of the attempt that produced it; writes from a superseded
//! generation are dropped.

mod output;

pub use output::{OutputState, PLACEHOLDER_TEXT, SAMPLE_INPUT};
#[cfg(test)]
pub use output::{ADVISORY_TEXT, COMPILING_TEXT};

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::broadcast;

/// Buffered events per subscriber before it starts lagging.
const EVENT_CAPACITY: usize = 64;

/// Change notification, one per accepted write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    InputChanged,
    OutputChanged {
        generation: u64,
        state: OutputState,
    },
}

/// Point-in-time view of the output panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub generation: u64,
    pub state: &'static str,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Default)]
struct EditorState {
    input: String,
    output: OutputState,
    generation: u64,
}

/// Shared handle to one session's buffers.
#[derive(Debug, Clone)]
pub struct Editor {
    state: Arc<RwLock<EditorState>>,
    events: broadcast::Sender<EditorEvent>,
    detailed_errors: bool,
}

impl Editor {
    pub fn new(input: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Arc::new(RwLock::new(EditorState {
                input: input.into(),
                ..Default::default()
            })),
            events,
            detailed_errors: false,
        }
    }

    /// Editor pre-filled with the sample program.
    pub fn with_sample() -> Self {
        Self::new(SAMPLE_INPUT)
    }

    /// Render failures as `error: <detail>` instead of the bare literal.
    pub fn with_detailed_errors(mut self, detailed: bool) -> Self {
        self.detailed_errors = detailed;
        self
    }

    #[cfg(test)]
    pub fn input(&self) -> String {
        self.state.read().input.clone()
    }

    /// Replace the input buffer. No validation happens here.
    pub fn set_input(&self, text: impl Into<String>) {
        self.state.write().input = text.into();
        let _ = self.events.send(EditorEvent::InputChanged);
    }

    pub fn output(&self) -> OutputState {
        self.state.read().output.clone()
    }

    /// Generation of the most recent attempt (0 before the first).
    #[cfg(test)]
    pub fn generation(&self) -> u64 {
        self.state.read().generation
    }

    /// Current output panel text.
    pub fn output_text(&self) -> String {
        self.state
            .read()
            .output
            .display_text(self.detailed_errors)
            .into_owned()
    }

    pub fn snapshot(&self) -> Snapshot {
        let state = self.state.read();
        Snapshot {
            generation: state.generation,
            state: state.output.label(),
            text: state.output.display_text(self.detailed_errors).into_owned(),
            detail: state.output.detail().map(str::to_owned),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.events.subscribe()
    }

    /// Open a new attempt: bump the generation and show `Compiling`.
    ///
    /// Returns the new generation and the input to compile, read under the
    /// same lock so the request matches what `Compiling` refers to.
    pub(crate) fn begin_attempt(&self) -> (u64, String) {
        let (generation, input) = {
            let mut state = self.state.write();
            state.generation += 1;
            state.output = OutputState::Compiling;
            (state.generation, state.input.clone())
        };
        let _ = self.events.send(EditorEvent::OutputChanged {
            generation,
            state: OutputState::Compiling,
        });
        (generation, input)
    }

    /// Write the output for `generation`.
    ///
    /// Returns `false` (and writes nothing) when a newer attempt has
    /// started since.
    pub(crate) fn set_output(&self, generation: u64, output: OutputState) -> bool {
        {
            let mut state = self.state.write();
            if state.generation != generation {
                return false;
            }
            state.output = output.clone();
        }
        let _ = self.events.send(EditorEvent::OutputChanged {
            generation,
            state: output,
        });
        true
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::with_sample()
    }
}
