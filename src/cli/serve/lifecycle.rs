//! Server lifecycle management.

use crate::{
    actor::{WorkflowHandle, spawn_workflow},
    compiler::Compiler,
    config::WorkflowConfig,
    core::register_server,
    editor::Editor,
    log,
};
use anyhow::{Context, Result};
use crossbeam::channel::{self, Receiver, Sender};
use std::{
    net::SocketAddr,
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};
use tiny_http::Server;

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// How long the actor gets to stop after shutdown is requested.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(500);

/// Bind to the specified interface and port, with automatic port retry.
pub fn bind_with_retry(
    interface: std::net::IpAddr,
    base_port: u16,
) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;
    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }
    Err(anyhow::anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        MAX_PORT_RETRIES,
        base_port,
        base_port.saturating_add(MAX_PORT_RETRIES - 1),
        last_error.map_or_else(|| "unknown error".to_string(), |e| e.to_string())
    ))
}

/// Register server for graceful shutdown.
///
/// When Ctrl+C is pressed, the handler set up in main() unblocks the
/// server and signals `shutdown_tx`.
pub fn register_server_for_shutdown(server: Arc<Server>, shutdown_tx: Sender<()>) {
    register_server(server, shutdown_tx);
}

/// Start the workflow actor on its own runtime thread.
///
/// Blocks until the actor is up and returns its handle together with the
/// thread, which exits after `shutdown_rx` fires.
pub fn spawn_workflow_runtime(
    editor: Editor,
    compiler: Arc<dyn Compiler>,
    config: WorkflowConfig,
    shutdown_rx: Receiver<()>,
) -> Result<(WorkflowHandle, JoinHandle<()>)> {
    let (ready_tx, ready_rx) = channel::bounded::<Result<WorkflowHandle>>(1);

    let thread = thread::Builder::new()
        .name("workflow".into())
        .spawn(move || run_workflow_runtime(editor, compiler, config, shutdown_rx, ready_tx))
        .context("Failed to spawn workflow thread")?;

    let handle = ready_rx
        .recv()
        .context("Workflow thread exited before starting")??;
    Ok((handle, thread))
}

fn run_workflow_runtime(
    editor: Editor,
    compiler: Arc<dyn Compiler>,
    config: WorkflowConfig,
    shutdown_rx: Receiver<()>,
    ready_tx: Sender<Result<WorkflowHandle>>,
) {
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            let _ = ready_tx.send(Err(anyhow::Error::new(e).context("Failed to create tokio runtime")));
            return;
        }
    };

    rt.block_on(async {
        let (handle, task) = spawn_workflow(editor, compiler, config);
        let _ = ready_tx.send(Ok(handle.clone()));

        loop {
            if shutdown_rx.try_recv().is_ok() {
                crate::debug!("workflow"; "shutdown signal received");
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        let _ = handle.shutdown().await;
        let _ = tokio::time::timeout(SHUTDOWN_TIMEOUT, task).await;
    });
}

/// Wait for the workflow thread to finish (max 2 seconds).
pub fn wait_for_shutdown(handle: JoinHandle<()>) {
    for _ in 0..40 {
        if handle.is_finished() {
            let _ = handle.join();
            return;
        }
        thread::sleep(Duration::from_millis(50));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::from_option;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_bind_with_retry_skips_taken_port() {
        let localhost = IpAddr::V4(Ipv4Addr::LOCALHOST);
        let (first, first_addr) = bind_with_retry(localhost, 0).unwrap();
        let taken = first.server_addr().to_ip().unwrap().port();
        assert_eq!(first_addr.port(), 0);

        let (_second, addr) = bind_with_retry(localhost, taken).unwrap();
        assert_ne!(addr.port(), taken);
    }

    #[test]
    fn test_runtime_thread_starts_and_stops() {
        let (tx, rx) = channel::unbounded();
        let compiler = Arc::new(from_option(|source: &str, _: i64| Some(source.to_uppercase())));
        let (handle, thread) =
            spawn_workflow_runtime(Editor::new("9am"), compiler, WorkflowConfig::default(), rx)
                .unwrap();

        assert!(handle.blocking_trigger().is_ok());
        tx.send(()).unwrap();
        wait_for_shutdown(thread);
        assert!(handle.blocking_trigger().is_err());
    }
}
