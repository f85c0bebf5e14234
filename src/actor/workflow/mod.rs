//! Workflow Actor - Compile Attempt Lifecycle
//!
//! Owns the only writers of the output panel. One loop serializes:
//! - triggers: snapshot input, show `Compiling`, arm the watchdog, spawn
//! - watchdog firing: show the advisory message (and abort in cancel mode)
//! - completion: show the artifact or `error`
//!
//! Each attempt carries the generation `Editor::begin_attempt` handed out,
//! so a result from a superseded attempt can never overwrite a newer one.

mod dispatch;
mod tasks;
mod watchdog;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

use super::messages::{Triggered, WorkflowMsg};
use crate::compiler::{Compiler, TokenClock};
use crate::config::WorkflowConfig;
use crate::editor::{Editor, EditorEvent, Snapshot};
use crate::export::ExportFile;

/// Channel buffer size
const CHANNEL_BUFFER: usize = 32;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("workflow actor has stopped")]
    Closed,
}

pub struct WorkflowActor {
    pub(super) rx: mpsc::Receiver<WorkflowMsg>,
    pub(super) editor: Editor,
    pub(super) compiler: Arc<dyn Compiler>,
    pub(super) config: WorkflowConfig,
    pub(super) clock: TokenClock,
}

impl WorkflowActor {
    pub fn new(
        rx: mpsc::Receiver<WorkflowMsg>,
        editor: Editor,
        compiler: Arc<dyn Compiler>,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            rx,
            editor,
            compiler,
            config,
            clock: TokenClock::new(),
        }
    }
}

/// Spawn the actor on the current runtime.
///
/// Returns the handle surfaces talk to and the actor's task, which ends
/// after [`WorkflowHandle::shutdown`] or once every handle is dropped.
pub fn spawn_workflow(
    editor: Editor,
    compiler: Arc<dyn Compiler>,
    config: WorkflowConfig,
) -> (WorkflowHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(CHANNEL_BUFFER);
    let handle = WorkflowHandle {
        tx,
        editor: editor.clone(),
    };
    let actor = WorkflowActor::new(rx, editor, compiler, config);
    (handle, tokio::spawn(actor.run()))
}

/// Cloneable façade over the actor and the editor it writes.
///
/// The `blocking_*` variants are for plain threads (HTTP handlers); they
/// panic when called from inside an async context.
#[derive(Debug, Clone)]
pub struct WorkflowHandle {
    tx: mpsc::Sender<WorkflowMsg>,
    editor: Editor,
}

impl WorkflowHandle {
    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn set_input(&self, text: impl Into<String>) {
        self.editor.set_input(text);
    }

    pub async fn trigger(&self) -> Result<Triggered, WorkflowError> {
        let (ack, rx) = oneshot::channel();
        self.tx
            .send(WorkflowMsg::Trigger { ack: Some(ack) })
            .await
            .map_err(|_| WorkflowError::Closed)?;
        rx.await.map_err(|_| WorkflowError::Closed)
    }

    pub fn blocking_trigger(&self) -> Result<Triggered, WorkflowError> {
        let (ack, rx) = oneshot::channel();
        self.tx
            .blocking_send(WorkflowMsg::Trigger { ack: Some(ack) })
            .map_err(|_| WorkflowError::Closed)?;
        rx.blocking_recv().map_err(|_| WorkflowError::Closed)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.editor.snapshot()
    }

    /// Capture the output panel as a download, whatever state it is in.
    pub fn export(&self, filename: &str) -> ExportFile {
        ExportFile::snapshot(&self.editor, filename)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.editor.subscribe()
    }

    pub async fn shutdown(&self) -> Result<(), WorkflowError> {
        self.tx
            .send(WorkflowMsg::Shutdown)
            .await
            .map_err(|_| WorkflowError::Closed)
    }
}
