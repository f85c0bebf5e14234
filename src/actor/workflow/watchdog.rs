use std::pin::Pin;
use std::time::Duration;

use tokio::time::{Sleep, sleep};

/// One-shot deadline for the in-flight attempt.
///
/// At most one deadline is armed. An unarmed watchdog never fires.
#[derive(Debug, Default)]
pub(super) struct Watchdog {
    deadline: Option<Pin<Box<Sleep>>>,
    generation: u64,
}

impl Watchdog {
    /// Arm for `generation`, replacing any previous deadline.
    pub(super) fn arm(&mut self, generation: u64, after: Duration) {
        self.deadline = Some(Box::pin(sleep(after)));
        self.generation = generation;
    }

    pub(super) fn disarm(&mut self) {
        self.deadline = None;
    }

    #[cfg(test)]
    pub(super) fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Resolve with the armed generation once the deadline passes.
    /// Firing disarms.
    pub(super) async fn fired(&mut self) -> u64 {
        match self.deadline.as_mut() {
            Some(deadline) => {
                deadline.await;
                self.deadline = None;
                self.generation
            }
            None => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{Instant, timeout};

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_at_deadline() {
        let mut watchdog = Watchdog::default();
        let start = Instant::now();
        watchdog.arm(7, Duration::from_millis(3000));

        assert_eq!(watchdog.fired().await, 7);
        assert!(start.elapsed() >= Duration::from_millis(3000));
        assert!(!watchdog.is_armed());

        let again = timeout(Duration::from_secs(60), watchdog.fired()).await;
        assert!(again.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_replaces_deadline() {
        let mut watchdog = Watchdog::default();
        let start = Instant::now();
        watchdog.arm(1, Duration::from_millis(100));
        watchdog.arm(2, Duration::from_millis(500));

        assert_eq!(watchdog.fired().await, 2);
        assert!(start.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarmed_never_fires() {
        let mut watchdog = Watchdog::default();
        watchdog.arm(1, Duration::from_millis(100));
        watchdog.disarm();

        let result = timeout(Duration::from_secs(10), watchdog.fired()).await;
        assert!(result.is_err());
    }
}
