//! Adapter for synchronous compile functions.
//!
//! The function runs on tokio's blocking pool. A panic inside it surfaces
//! as a `JoinError` and becomes [`CompileError::Panicked`] instead of
//! tearing down the workflow.

use std::sync::Arc;

use super::{CompileError, CompileFuture, CompileRequest, Compiler, panic_message};

/// Wraps `Fn(source, token) -> Result<artifact, CompileError>`.
pub struct BlockingCompiler<F> {
    func: Arc<F>,
}

impl<F> BlockingCompiler<F>
where
    F: Fn(&str, i64) -> Result<String, CompileError> + Send + Sync + 'static,
{
    pub fn new(func: F) -> Self {
        Self {
            func: Arc::new(func),
        }
    }
}

/// Adapt a function that signals failure by returning nothing.
///
/// `None` becomes [`CompileError::NoArtifact`], so the failure still
/// carries a reason.
pub fn from_option<G>(
    func: G,
) -> BlockingCompiler<impl Fn(&str, i64) -> Result<String, CompileError> + Send + Sync + 'static>
where
    G: Fn(&str, i64) -> Option<String> + Send + Sync + 'static,
{
    BlockingCompiler::new(move |source: &str, token: i64| {
        func(source, token).ok_or(CompileError::NoArtifact)
    })
}

impl<F> Compiler for BlockingCompiler<F>
where
    F: Fn(&str, i64) -> Result<String, CompileError> + Send + Sync + 'static,
{
    fn compile(&self, request: CompileRequest) -> CompileFuture {
        let func = Arc::clone(&self.func);
        Box::pin(async move {
            let joined =
                tokio::task::spawn_blocking(move || func(&request.source, request.token)).await;
            match joined {
                Ok(result) => result,
                Err(e) if e.is_panic() => Err(CompileError::Panicked(panic_message(e.into_panic()))),
                Err(_) => Err(CompileError::Cancelled),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_returns_artifact_and_sees_request() {
        let compiler = BlockingCompiler::new(|source: &str, token: i64| {
            Ok(format!("{token}:{source}"))
        });
        let out = compiler
            .compile(CompileRequest::new("9am do stuff", 1_680_307_200_000))
            .await
            .unwrap();
        assert_eq!(out, "1680307200000:9am do stuff");
    }

    #[tokio::test]
    async fn test_none_becomes_no_artifact() {
        let compiler = from_option(|_: &str, _: i64| None);
        let err = compiler
            .compile(CompileRequest::new("garbage", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, CompileError::NoArtifact));
    }

    #[tokio::test]
    async fn test_some_passes_through() {
        let compiler = from_option(|source: &str, _: i64| Some(source.to_uppercase()));
        let out = compiler.compile(CompileRequest::new("ics", 1)).await.unwrap();
        assert_eq!(out, "ICS");
    }

    #[tokio::test]
    async fn test_panic_is_caught() {
        let compiler = BlockingCompiler::new(|_: &str, _: i64| -> Result<String, CompileError> {
            panic!("parser exploded")
        });
        let err = compiler
            .compile(CompileRequest::new("x", 1))
            .await
            .unwrap_err();
        match err {
            CompileError::Panicked(message) => assert_eq!(message, "parser exploded"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
