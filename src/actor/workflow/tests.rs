use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::time::{Instant, sleep};

use super::{WorkflowError, WorkflowHandle, spawn_workflow};
use crate::actor::messages::Triggered;
use crate::compiler::{CompileError, CompileFuture, CompileRequest, Compiler, from_option};
use crate::config::{OverlapPolicy, WatchdogMode, WorkflowConfig};
use crate::editor::{ADVISORY_TEXT, COMPILING_TEXT, Editor, EditorEvent, OutputState};

const ICAL: &str = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nBEGIN:VEVENT\r\nDTSTART:20230401T090000\r\nSUMMARY:do stuff\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";

#[derive(Clone, Copy)]
enum Outcome {
    Artifact(&'static str),
    Echo,
    Reject(&'static str),
    Panic,
}

/// Async fake: sleeps on the (paused) tokio clock, then answers.
struct FakeCompiler {
    delays: Mutex<VecDeque<Duration>>,
    fallback: Duration,
    outcome: Outcome,
    requests: Mutex<Vec<CompileRequest>>,
    finished: Arc<AtomicUsize>,
}

impl FakeCompiler {
    fn new(delay_ms: u64, outcome: Outcome) -> Arc<Self> {
        Self::with_delays(&[], delay_ms, outcome)
    }

    fn with_delays(delays_ms: &[u64], fallback_ms: u64, outcome: Outcome) -> Arc<Self> {
        Arc::new(Self {
            delays: Mutex::new(delays_ms.iter().copied().map(Duration::from_millis).collect()),
            fallback: Duration::from_millis(fallback_ms),
            outcome,
            requests: Mutex::new(Vec::new()),
            finished: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn requests(&self) -> Vec<CompileRequest> {
        self.requests.lock().clone()
    }

    fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

impl Compiler for FakeCompiler {
    fn compile(&self, request: CompileRequest) -> CompileFuture {
        self.requests.lock().push(request.clone());
        let delay = self.delays.lock().pop_front().unwrap_or(self.fallback);
        let outcome = self.outcome;
        let finished = Arc::clone(&self.finished);

        Box::pin(async move {
            sleep(delay).await;
            finished.fetch_add(1, Ordering::SeqCst);
            match outcome {
                Outcome::Artifact(text) => Ok(text.to_string()),
                Outcome::Echo => Ok(format!("compiled {}", request.source)),
                Outcome::Reject(reason) => Err(CompileError::Rejected(reason.into())),
                Outcome::Panic => panic!("compiler blew up"),
            }
        })
    }
}

fn config(watchdog: WatchdogMode, overlap: OverlapPolicy) -> WorkflowConfig {
    WorkflowConfig {
        watchdog,
        overlap,
        ..WorkflowConfig::default()
    }
}

fn start(
    input: &str,
    compiler: Arc<dyn Compiler>,
    config: WorkflowConfig,
) -> (WorkflowHandle, broadcast::Receiver<EditorEvent>) {
    let editor = Editor::new(input);
    let events = editor.subscribe();
    let (handle, _task) = spawn_workflow(editor, compiler, config);
    (handle, events)
}

/// Next output write, skipping input notifications.
async fn next_output(events: &mut broadcast::Receiver<EditorEvent>) -> (u64, OutputState) {
    loop {
        match events.recv().await.unwrap() {
            EditorEvent::OutputChanged { generation, state } => return (generation, state),
            EditorEvent::InputChanged => continue,
        }
    }
}

fn assert_quiet(events: &mut broadcast::Receiver<EditorEvent>) {
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

fn assert_elapsed_near(start: Instant, ms: u64) {
    let elapsed = start.elapsed();
    assert!(
        elapsed >= Duration::from_millis(ms) && elapsed < Duration::from_millis(ms + 50),
        "expected ~{ms}ms, got {elapsed:?}"
    );
}

// =============================================================================
// Success and failure
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_compiling_precedes_artifact() {
    let compiler = FakeCompiler::new(200, Outcome::Artifact(ICAL));
    let (handle, mut events) = start("2023-4-1\n9am do stuff", compiler.clone(), WorkflowConfig::default());

    let triggered = handle.trigger().await.unwrap();
    assert_eq!(triggered, Triggered::Started { generation: 1 });

    assert_eq!(next_output(&mut events).await, (1, OutputState::Compiling));
    assert_eq!(
        next_output(&mut events).await,
        (1, OutputState::Succeeded(ICAL.into()))
    );
    assert_eq!(handle.editor().output_text(), ICAL);
    assert_eq!(handle.export("timeblok.ics").bytes, ICAL.as_bytes());

    let requests = compiler.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].source, "2023-4-1\n9am do stuff");
    assert!(requests[0].token > 0);
}

#[tokio::test(start_paused = true)]
async fn test_input_is_snapshotted_at_trigger() {
    let compiler = FakeCompiler::new(500, Outcome::Echo);
    let (handle, mut events) = start("before", compiler.clone(), WorkflowConfig::default());

    handle.trigger().await.unwrap();
    handle.set_input("after");

    next_output(&mut events).await;
    let (_, state) = next_output(&mut events).await;
    assert_eq!(state, OutputState::Succeeded("compiled before".into()));
    assert_eq!(handle.editor().input(), "after");
}

#[tokio::test(start_paused = true)]
async fn test_rejection_shows_error_and_keeps_detail() {
    let compiler = FakeCompiler::new(10, Outcome::Reject("unknown date `2023-13-1`"));
    let (handle, mut events) = start("2023-13-1", compiler, WorkflowConfig::default());

    handle.trigger().await.unwrap();
    next_output(&mut events).await;
    let (_, state) = next_output(&mut events).await;

    assert_eq!(state, OutputState::Failed("unknown date `2023-13-1`".into()));
    let snapshot = handle.snapshot();
    assert_eq!(snapshot.text, "error");
    assert_eq!(snapshot.state, "failed");
    assert_eq!(snapshot.detail.as_deref(), Some("unknown date `2023-13-1`"));
}

#[tokio::test]
async fn test_missing_artifact_shows_error() {
    let compiler = Arc::new(from_option(|_: &str, _: i64| None));
    let (handle, mut events) = start("garbage", compiler, WorkflowConfig::default());

    handle.trigger().await.unwrap();
    assert_eq!(next_output(&mut events).await.1, OutputState::Compiling);
    let (_, state) = next_output(&mut events).await;

    assert!(matches!(state, OutputState::Failed(_)));
    assert_eq!(handle.editor().output_text(), "error");
}

#[tokio::test(start_paused = true)]
async fn test_panic_is_contained() {
    let compiler = FakeCompiler::new(10, Outcome::Panic);
    let (handle, mut events) = start("x", compiler, WorkflowConfig::default());

    handle.trigger().await.unwrap();
    next_output(&mut events).await;
    let (_, state) = next_output(&mut events).await;

    let OutputState::Failed(detail) = state else {
        panic!("expected failure, got {state:?}");
    };
    assert!(detail.contains("compiler blew up"));
    assert_eq!(handle.editor().output_text(), "error");

    // The actor survives and serves the next trigger.
    assert!(handle.trigger().await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_fast_result_disarms_watchdog() {
    let compiler = FakeCompiler::new(100, Outcome::Artifact(ICAL));
    let (handle, mut events) = start("x", compiler, WorkflowConfig::default());

    handle.trigger().await.unwrap();
    next_output(&mut events).await;
    next_output(&mut events).await;

    sleep(Duration::from_secs(10)).await;
    assert_quiet(&mut events);
    assert_eq!(handle.editor().output_text(), ICAL);
}

// =============================================================================
// Watchdog
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_cancel_mode_timeout_is_final() {
    let compiler = FakeCompiler::new(5000, Outcome::Artifact(ICAL));
    let (handle, mut events) = start(
        "x",
        compiler.clone(),
        config(WatchdogMode::Cancel, OverlapPolicy::Replace),
    );

    let begin = Instant::now();
    handle.trigger().await.unwrap();
    next_output(&mut events).await;
    assert_eq!(next_output(&mut events).await, (1, OutputState::TimedOut));
    assert_elapsed_near(begin, 3000);
    assert_eq!(handle.editor().output_text(), ADVISORY_TEXT);

    sleep(Duration::from_secs(10)).await;
    assert_quiet(&mut events);
    assert_eq!(compiler.finished(), 0);
    assert_eq!(handle.editor().output_text(), ADVISORY_TEXT);
}

#[tokio::test(start_paused = true)]
async fn test_advisory_mode_late_result_overwrites() {
    let compiler = FakeCompiler::new(5000, Outcome::Artifact(ICAL));
    let (handle, mut events) = start(
        "x",
        compiler.clone(),
        config(WatchdogMode::Advisory, OverlapPolicy::Replace),
    );

    let begin = Instant::now();
    handle.trigger().await.unwrap();
    assert_eq!(next_output(&mut events).await.1, OutputState::Compiling);

    assert_eq!(next_output(&mut events).await, (1, OutputState::TimedOut));
    assert_elapsed_near(begin, 3000);

    assert_eq!(
        next_output(&mut events).await,
        (1, OutputState::Succeeded(ICAL.into()))
    );
    assert_elapsed_near(begin, 5000);
    assert_eq!(compiler.finished(), 1);
    assert_eq!(handle.editor().output_text(), ICAL);
}

#[tokio::test(start_paused = true)]
async fn test_custom_watchdog_deadline() {
    let compiler = FakeCompiler::new(1000, Outcome::Artifact(ICAL));
    let config = WorkflowConfig {
        watchdog_ms: 250,
        ..WorkflowConfig::default()
    };
    let (handle, mut events) = start("x", compiler, config);

    let begin = Instant::now();
    handle.trigger().await.unwrap();
    next_output(&mut events).await;
    assert_eq!(next_output(&mut events).await.1, OutputState::TimedOut);
    assert_elapsed_near(begin, 250);
}

// =============================================================================
// Overlapping triggers
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_replace_supersedes_in_flight_attempt() {
    let compiler = FakeCompiler::with_delays(&[2000, 100], 100, Outcome::Echo);
    let (handle, mut events) = start(
        "first",
        compiler.clone(),
        config(WatchdogMode::Cancel, OverlapPolicy::Replace),
    );

    assert_eq!(
        handle.trigger().await.unwrap(),
        Triggered::Started { generation: 1 }
    );
    handle.set_input("second");
    assert_eq!(
        handle.trigger().await.unwrap(),
        Triggered::Started { generation: 2 }
    );

    assert_eq!(next_output(&mut events).await, (1, OutputState::Compiling));
    assert_eq!(next_output(&mut events).await, (2, OutputState::Compiling));
    assert_eq!(
        next_output(&mut events).await,
        (2, OutputState::Succeeded("compiled second".into()))
    );

    sleep(Duration::from_secs(10)).await;
    assert_quiet(&mut events);
    assert_eq!(compiler.finished(), 1);
    assert_eq!(handle.editor().output_text(), "compiled second");

    let tokens: Vec<i64> = compiler.requests().iter().map(|r| r.token).collect();
    assert!(tokens[1] > tokens[0]);
}

#[tokio::test(start_paused = true)]
async fn test_ignore_keeps_in_flight_attempt() {
    let compiler = FakeCompiler::new(1000, Outcome::Echo);
    let (handle, mut events) = start(
        "first",
        compiler.clone(),
        config(WatchdogMode::Cancel, OverlapPolicy::Ignore),
    );

    handle.trigger().await.unwrap();
    handle.set_input("second");
    assert_eq!(
        handle.trigger().await.unwrap(),
        Triggered::Ignored { generation: 1 }
    );

    assert_eq!(next_output(&mut events).await, (1, OutputState::Compiling));
    assert_eq!(
        next_output(&mut events).await,
        (1, OutputState::Succeeded("compiled first".into()))
    );
    assert_eq!(compiler.requests().len(), 1);

    // Idle again: the next trigger starts.
    assert_eq!(
        handle.trigger().await.unwrap(),
        Triggered::Started { generation: 2 }
    );
}

#[tokio::test(start_paused = true)]
async fn test_ignore_yields_to_retry_after_advisory_timeout() {
    // First attempt hangs for an hour, the retry answers quickly.
    let compiler = FakeCompiler::with_delays(&[3_600_000], 100, Outcome::Echo);
    let (handle, mut events) = start(
        "first",
        compiler.clone(),
        config(WatchdogMode::Advisory, OverlapPolicy::Ignore),
    );

    handle.trigger().await.unwrap();
    assert_eq!(
        handle.trigger().await.unwrap(),
        Triggered::Ignored { generation: 1 }
    );
    assert_eq!(next_output(&mut events).await, (1, OutputState::Compiling));
    assert_eq!(next_output(&mut events).await, (1, OutputState::TimedOut));

    handle.set_input("second");
    assert_eq!(
        handle.trigger().await.unwrap(),
        Triggered::Started { generation: 2 }
    );
    assert_eq!(next_output(&mut events).await, (2, OutputState::Compiling));
    assert_eq!(
        next_output(&mut events).await,
        (2, OutputState::Succeeded("compiled second".into()))
    );

    sleep(Duration::from_secs(3600)).await;
    assert_quiet(&mut events);
    assert_eq!(compiler.finished(), 1);
    assert_eq!(handle.editor().output_text(), "compiled second");
}

// =============================================================================
// Export and shutdown
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_export_while_compiling_captures_placeholder() {
    let compiler = FakeCompiler::new(1000, Outcome::Artifact(ICAL));
    let (handle, _events) = start("x", compiler, WorkflowConfig::default());

    handle.trigger().await.unwrap();
    let file = handle.export("timeblok.ics");
    assert_eq!(file.filename, "timeblok.ics");
    assert_eq!(file.bytes, COMPILING_TEXT.as_bytes());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_aborts_in_flight_attempt() {
    let compiler = FakeCompiler::new(5000, Outcome::Artifact(ICAL));
    let editor = Editor::new("x");
    let mut events = editor.subscribe();
    let (handle, task) = spawn_workflow(editor, compiler.clone(), WorkflowConfig::default());

    handle.trigger().await.unwrap();
    handle.shutdown().await.unwrap();
    task.await.unwrap();

    assert_eq!(next_output(&mut events).await.1, OutputState::Compiling);
    sleep(Duration::from_secs(10)).await;
    assert_quiet(&mut events);
    assert_eq!(compiler.finished(), 0);
    assert!(matches!(handle.trigger().await, Err(WorkflowError::Closed)));
}
