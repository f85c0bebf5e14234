//! Actor System for the Compile Workflow
//!
//! Message-passing concurrency for the playground:
//!
//! ```text
//! surfaces --WorkflowMsg--> WorkflowActor --set_output--> Editor --EditorEvent--> subscribers
//! (http, cli)                (one loop)                                           (status, tests)
//! ```
//!
//! # Module Structure
//!
//! - `messages` - Message types sent to the actor
//! - `workflow` - Compile workflow: trigger, watchdog, completion

pub mod messages;
pub mod workflow;

pub use messages::Triggered;
pub use workflow::{WorkflowError, WorkflowHandle, spawn_workflow};
