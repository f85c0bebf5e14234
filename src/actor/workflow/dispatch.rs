use tokio::sync::oneshot;

use super::WorkflowActor;
use super::tasks::{Attempt, AttemptResult, abort_attempt, spawn_attempt, wait_attempt};
use super::watchdog::Watchdog;
use crate::actor::messages::{Triggered, WorkflowMsg};
use crate::compiler::{CompileError, CompileRequest, panic_message};
use crate::config::{OverlapPolicy, WatchdogMode};
use crate::editor::OutputState;

impl WorkflowActor {
    /// Main event loop. Every output write happens here, in select order.
    pub async fn run(mut self) {
        let mut attempt: Option<Attempt> = None;
        let mut watchdog = Watchdog::default();

        loop {
            tokio::select! {
                biased;

                msg = self.rx.recv() => match msg {
                    Some(WorkflowMsg::Trigger { ack }) => {
                        self.on_trigger(ack, &mut attempt, &mut watchdog);
                    }
                    Some(WorkflowMsg::Shutdown) | None => {
                        abort_attempt(&mut attempt);
                        watchdog.disarm();
                        crate::debug!("workflow"; "shutting down");
                        break;
                    }
                },

                generation = watchdog.fired() => {
                    self.on_watchdog(generation, &mut attempt);
                }

                (generation, result) = wait_attempt(&mut attempt) => {
                    let started = attempt.take().map(|a| a.started);
                    watchdog.disarm();
                    self.on_compiled(generation, result);
                    if let Some(started) = started {
                        crate::debug!("workflow"; "attempt #{} finished in {:?}", generation, started.elapsed());
                    }
                }
            }
        }
    }

    fn on_trigger(
        &mut self,
        ack: Option<oneshot::Sender<Triggered>>,
        attempt: &mut Option<Attempt>,
        watchdog: &mut Watchdog,
    ) {
        // A timed-out attempt may never return, so it cannot hold off a retry
        if self.config.overlap == OverlapPolicy::Ignore {
            if let Some(current) = attempt.as_ref().filter(|a| !a.timed_out) {
                let generation = current.generation;
                crate::debug!("workflow"; "attempt #{} still running, trigger ignored", generation);
                reply(ack, Triggered::Ignored { generation });
                return;
            }
        }

        abort_attempt(attempt);

        let (generation, source) = self.editor.begin_attempt();
        let request = CompileRequest::new(source, self.clock.next());
        crate::debug!("workflow"; "attempt #{} started (token {})", generation, request.token);

        watchdog.arm(generation, self.config.watchdog_duration());
        *attempt = Some(spawn_attempt(&self.compiler, request, generation));
        reply(ack, Triggered::Started { generation });
    }

    fn on_watchdog(&mut self, generation: u64, attempt: &mut Option<Attempt>) {
        match self.config.watchdog {
            WatchdogMode::Cancel => abort_attempt(attempt),
            WatchdogMode::Advisory => {
                if let Some(current) = attempt.as_mut() {
                    current.timed_out = true;
                }
            }
        }
        if self.editor.set_output(generation, OutputState::TimedOut) {
            crate::debug!(
                "workflow";
                "attempt #{} exceeded {}ms",
                generation,
                self.config.watchdog_ms
            );
        }
    }

    fn on_compiled(&mut self, generation: u64, result: AttemptResult) {
        let state = match result {
            Ok(Ok(artifact)) => OutputState::Succeeded(artifact),
            Ok(Err(err)) => OutputState::Failed(err.to_string()),
            Err(err) if err.is_panic() => {
                let err = CompileError::Panicked(panic_message(err.into_panic()));
                OutputState::Failed(err.to_string())
            }
            Err(_) => OutputState::Failed(CompileError::Cancelled.to_string()),
        };

        if !self.editor.set_output(generation, state) {
            crate::debug!("workflow"; "dropped stale result of attempt #{}", generation);
        }
    }
}

fn reply(ack: Option<oneshot::Sender<Triggered>>, triggered: Triggered) {
    if let Some(ack) = ack {
        let _ = ack.send(triggered);
    }
}
