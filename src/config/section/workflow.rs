//! `[workflow]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [workflow]
//! watchdog_ms = 3000          # Deadline before the advisory message shows
//! watchdog = "cancel"         # "cancel" stops the attempt, "advisory" only updates the panel
//! overlap = "replace"         # "replace" restarts on a new trigger, "ignore" drops it
//! detailed_errors = false     # Show "error: <detail>" instead of "error"
//! grace_ms = 10000            # `tbplay compile`: wait this long for a late result
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;

/// What happens when the watchdog deadline elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchdogMode {
    /// Abort the attempt; the advisory message is final.
    #[default]
    Cancel,
    /// Show the advisory message but let the compiler finish; its result
    /// replaces the message when it arrives.
    Advisory,
}

/// What a trigger does while another attempt is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlapPolicy {
    /// Cancel the in-flight attempt and start over.
    #[default]
    Replace,
    /// Keep the in-flight attempt; the new trigger is dropped. Once the
    /// attempt has timed out a trigger replaces it.
    Ignore,
}

/// Compile workflow settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub watchdog_ms: u64,
    pub watchdog: WatchdogMode,
    pub overlap: OverlapPolicy,
    pub detailed_errors: bool,
    pub grace_ms: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            watchdog_ms: 3000,
            watchdog: WatchdogMode::Cancel,
            overlap: OverlapPolicy::Replace,
            detailed_errors: false,
            grace_ms: 10_000,
        }
    }
}

impl WorkflowConfig {
    pub const fn watchdog_duration(&self) -> Duration {
        Duration::from_millis(self.watchdog_ms)
    }

    pub const fn grace_duration(&self) -> Duration {
        Duration::from_millis(self.grace_ms)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.watchdog_ms == 0 {
            diag.error_with_hint(
                "workflow.watchdog_ms",
                "must be greater than 0",
                "the observed default is 3000",
            );
        }
    }
}
