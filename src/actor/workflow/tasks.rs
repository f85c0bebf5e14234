use std::sync::Arc;

use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;

use crate::compiler::{CompileError, CompileRequest, Compiler};

pub(super) type AttemptResult = Result<Result<String, CompileError>, JoinError>;

/// The compile attempt currently in flight.
pub(super) struct Attempt {
    pub(super) generation: u64,
    pub(super) handle: JoinHandle<Result<String, CompileError>>,
    pub(super) started: Instant,
    /// The watchdog already fired; only an advisory-mode attempt gets here.
    pub(super) timed_out: bool,
}

/// Spawn the compile as a background task.
pub(super) fn spawn_attempt(
    compiler: &Arc<dyn Compiler>,
    request: CompileRequest,
    generation: u64,
) -> Attempt {
    let future = compiler.compile(request);
    Attempt {
        generation,
        handle: tokio::spawn(future),
        started: Instant::now(),
        timed_out: false,
    }
}

/// Abort the attempt if running. Dropping its future kills any child process.
pub(super) fn abort_attempt(attempt: &mut Option<Attempt>) {
    if let Some(a) = attempt.take() {
        a.handle.abort();
        crate::debug!("workflow"; "aborted attempt #{}", a.generation);
    }
}

/// Wait for the attempt (pending forever if None).
///
/// Borrows the handle rather than taking it, so losing a `select!` race
/// leaves the attempt in place.
pub(super) async fn wait_attempt(attempt: &mut Option<Attempt>) -> (u64, AttemptResult) {
    match attempt {
        Some(a) => {
            let result = (&mut a.handle).await;
            (a.generation, result)
        }
        None => std::future::pending().await,
    }
}
