//! Actor Message Definitions
//!
//! ```text
//! WorkflowHandle --Trigger--> WorkflowActor --Triggered--> caller
//! ```

use tokio::sync::oneshot;

/// Messages to the Workflow Actor
#[derive(Debug)]
pub enum WorkflowMsg {
    /// Start a compile attempt from the current input buffer
    Trigger {
        /// Told which generation the trigger resolved to (None = fire and forget)
        ack: Option<oneshot::Sender<Triggered>>,
    },
    /// Abort any in-flight attempt and stop
    Shutdown,
}

/// How the actor handled a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Triggered {
    /// A new attempt started under this generation.
    Started { generation: u64 },
    /// An attempt was already running and the overlap policy kept it.
    Ignored { generation: u64 },
}

impl Triggered {
    pub const fn generation(self) -> u64 {
        match self {
            Self::Started { generation } | Self::Ignored { generation } => generation,
        }
    }
}
