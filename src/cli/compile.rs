//! `tbplay compile`: one trigger, watched to a terminal state.
//!
//! ```text
//! Compiling...  →  <artifact> | error | advisory (→ late result in advisory mode)
//! ```

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::{Instant, timeout_at};

use super::CompileArgs;
use crate::actor::spawn_workflow;
use crate::compiler::Compiler;
use crate::config::{PlaygroundConfig, WatchdogMode, WorkflowConfig};
use crate::editor::{Editor, EditorEvent, OutputState};
use crate::export::ExportFile;
use crate::logger::WatchStatus;
use crate::log;

/// Run the command. Returns `false` when the attempt did not succeed.
pub fn run_compile(args: &CompileArgs, config: &PlaygroundConfig) -> Result<bool> {
    let source = read_source(&args.input)?;
    let compiler = super::build_compiler(config);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;
    let (state, export) = runtime.block_on(compile_once(
        source,
        compiler,
        &config.workflow,
        &config.export.filename,
        &mut WatchStatus::new(),
    ))?;

    if let OutputState::Succeeded(artifact) = &state {
        print!("{artifact}");
    }

    if let Some(dir) = &args.export {
        let dir = export_dir(dir.as_deref(), config);
        let path = export.write_to(&dir)?;
        log!("export"; "{}", path.display());
    }

    Ok(matches!(state, OutputState::Succeeded(_)))
}

fn read_source(input: &Path) -> Result<String> {
    if input == Path::new("-") {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .context("Failed to read source from stdin")?;
        return Ok(source);
    }
    std::fs::read_to_string(input).with_context(|| format!("Failed to read {}", input.display()))
}

/// `--export DIR` is taken as given; bare `--export` uses `export.dir`.
fn export_dir(flag: Option<&Path>, config: &PlaygroundConfig) -> PathBuf {
    flag.map_or_else(|| config.export.dir.clone(), Path::to_path_buf)
}

/// Drive a single attempt and report each transition on `status`.
///
/// Returns the final output state and the export snapshot taken at that
/// moment.
async fn compile_once(
    source: String,
    compiler: Arc<dyn Compiler>,
    workflow: &WorkflowConfig,
    filename: &str,
    status: &mut WatchStatus,
) -> Result<(OutputState, ExportFile)> {
    let editor = Editor::new(source).with_detailed_errors(workflow.detailed_errors);
    let (handle, task) = spawn_workflow(editor, compiler, workflow.clone());
    let mut events = handle.subscribe();

    let generation = handle.trigger().await?.generation();
    watch(&mut events, generation, workflow, status).await;

    let state = handle.editor().output();
    let export = handle.export(filename);

    handle.shutdown().await?;
    let _ = task.await;
    Ok((state, export))
}

/// Follow `generation` until it settles. In advisory mode a timeout is
/// followed by up to `grace_ms` of waiting for the late result.
async fn watch(
    events: &mut broadcast::Receiver<EditorEvent>,
    generation: u64,
    workflow: &WorkflowConfig,
    status: &mut WatchStatus,
) {
    let mut deadline: Option<Instant> = None;

    loop {
        let received = match deadline {
            Some(deadline) => match timeout_at(deadline, events.recv()).await {
                Ok(received) => received,
                Err(_) => {
                    status.warning("gave up waiting for a late result");
                    return;
                }
            },
            None => events.recv().await,
        };

        let state = match received {
            Ok(EditorEvent::OutputChanged {
                generation: g,
                state,
            }) if g == generation => state,
            Ok(_) | Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => return,
        };

        let text = state.display_text(workflow.detailed_errors);
        match &state {
            OutputState::Idle => {}
            OutputState::Compiling => status.pending(&text),
            OutputState::Succeeded(artifact) => {
                status.success(&format!("compiled ({} bytes)", artifact.len()));
            }
            OutputState::Failed(detail) => {
                status.error(&text, if workflow.detailed_errors { "" } else { detail.as_str() });
            }
            OutputState::TimedOut => status.warning(&text),
        }

        let late_result_possible =
            state == OutputState::TimedOut && workflow.watchdog == WatchdogMode::Advisory;
        if late_result_possible {
            deadline = Some(Instant::now() + workflow.grace_duration());
        } else if state.is_terminal() {
            return;
        }
    }
}
