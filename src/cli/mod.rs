//! Command-line interface module.

mod args;
pub mod compile;
pub mod serve;

pub use args::{Cli, CompileArgs, Commands, WorkflowArgs};

use std::sync::Arc;

use crate::compiler::{Compiler, ProcessCompiler};
use crate::config::PlaygroundConfig;

/// The compiler every command drives: `[compiler].command`, run from the
/// config root.
pub fn build_compiler(config: &PlaygroundConfig) -> Arc<dyn Compiler> {
    let compiler = ProcessCompiler::from_config(&config.compiler, &config.root);
    crate::debug!("compile"; "using `{}`", compiler.program());
    Arc::new(compiler)
}
