//! Output panel state.
//!
//! The canonical output is a tagged state, never display text. The panel
//! text is derived from the tag by [`OutputState::display_text`].

use std::borrow::Cow;

/// Status written while a compile attempt is outstanding.
pub const COMPILING_TEXT: &str = "Compiling...";

/// Status written when the watchdog deadline elapses first.
pub const ADVISORY_TEXT: &str = "Compilation took too long. An exception might have occured, \
please wait until we further improve our error handling process.";

/// Status written for any failed attempt.
pub const ERROR_TEXT: &str = "error";

/// Output panel contents before the first compile.
pub const PLACEHOLDER_TEXT: &str = "The compiled calendar (ics) will be displayed here.";

/// Input panel contents when a session starts.
pub const SAMPLE_INPUT: &str = "2023-4-1\n9am do stuff\n";

/// What the output panel currently holds.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputState {
    /// Nothing compiled yet.
    #[default]
    Idle,
    /// An attempt is outstanding.
    Compiling,
    /// The compiler produced an artifact.
    Succeeded(String),
    /// The compiler failed; the detail is kept even when not displayed.
    Failed(String),
    /// The watchdog fired before the compiler returned.
    TimedOut,
}

impl OutputState {
    /// Stable lowercase name, used in `/status` and logs.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Compiling => "compiling",
            Self::Succeeded(_) => "succeeded",
            Self::Failed(_) => "failed",
            Self::TimedOut => "timed_out",
        }
    }

    /// Whether this state ends an attempt from the user's point of view.
    ///
    /// `TimedOut` counts: in advisory mode a late result may still replace
    /// it, but nothing guarantees one will arrive.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::Failed(_) | Self::TimedOut)
    }

    /// Failure detail, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Failed(detail) => Some(detail),
            _ => None,
        }
    }

    /// Text shown in the output panel.
    ///
    /// With `detailed_errors` off a failure renders as the bare `error`
    /// literal; on, the detail is appended.
    pub fn display_text(&self, detailed_errors: bool) -> Cow<'_, str> {
        match self {
            Self::Idle => Cow::Borrowed(PLACEHOLDER_TEXT),
            Self::Compiling => Cow::Borrowed(COMPILING_TEXT),
            Self::Succeeded(artifact) => Cow::Borrowed(artifact),
            Self::Failed(detail) if detailed_errors && !detail.is_empty() => {
                Cow::Owned(format!("{ERROR_TEXT}: {detail}"))
            }
            Self::Failed(_) => Cow::Borrowed(ERROR_TEXT),
            Self::TimedOut => Cow::Borrowed(ADVISORY_TEXT),
        }
    }
}
