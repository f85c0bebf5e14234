//! External compiler seam.
//!
//! The playground never parses timeblok itself. A [`Compiler`] receives a
//! [`CompileRequest`] and resolves to either the artifact text or a typed
//! [`CompileError`]:
//!
//! - `blocking` - wraps a synchronous function, run off the async threads
//! - `process` - runs an external command (the `timeblok` CLI by default)

#[cfg(test)]
mod blocking;
mod process;

#[cfg(test)]
pub use blocking::{BlockingCompiler, from_option};
pub use process::ProcessCompiler;

use std::any::Any;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

/// Boxed future returned by [`Compiler::compile`].
pub type CompileFuture = Pin<Box<dyn Future<Output = Result<String, CompileError>> + Send>>;

/// One compile attempt's input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRequest {
    /// Source text, as the input buffer held it when the attempt began.
    pub source: String,
    /// Milliseconds since the Unix epoch; doubles as the request token.
    pub token: i64,
}

impl CompileRequest {
    pub fn new(source: impl Into<String>, token: i64) -> Self {
        Self {
            source: source.into(),
            token,
        }
    }
}

/// Why an attempt produced no artifact.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("compiler returned no artifact")]
    NoArtifact,

    #[error("{0}")]
    Rejected(String),

    #[error("compiler exited with {}: {stderr}", exit_status(.code))]
    Exited { code: Option<i32>, stderr: String },

    #[error("failed to start `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("compiler output is not valid UTF-8")]
    NotUtf8,

    #[error("compiler I/O error")]
    Io(#[from] std::io::Error),

    #[error("compiler panicked: {0}")]
    Panicked(String),

    #[error("compile attempt was cancelled")]
    Cancelled,
}

/// A black-box compiler.
///
/// Implementations must not assume they run to completion: the workflow
/// drops the returned future when an attempt is cancelled.
pub trait Compiler: Send + Sync + 'static {
    fn compile(&self, request: CompileRequest) -> CompileFuture;
}

/// Issues request tokens: wall-clock milliseconds, strictly increasing.
#[derive(Debug, Default)]
pub struct TokenClock {
    last: AtomicI64,
}

impl TokenClock {
    pub const fn new() -> Self {
        Self {
            last: AtomicI64::new(0),
        }
    }

    /// Next token. A stalled or backwards clock yields `last + 1`.
    pub fn next(&self) -> i64 {
        self.next_from(wall_clock_millis())
    }

    fn next_from(&self, now: i64) -> i64 {
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let token = now.max(last + 1);
            match self
                .last
                .compare_exchange_weak(last, token, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return token,
                Err(actual) => last = actual,
            }
        }
    }
}

fn wall_clock_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

fn exit_status(code: &Option<i32>) -> String {
    code.map_or_else(|| "a signal".to_string(), |c| format!("status {c}"))
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
