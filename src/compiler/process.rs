//! Adapter that runs an external compiler command.
//!
//! Each attempt gets a scratch directory holding the source file. The
//! command line may reference `$PLAYGROUND_*` variables, which are both
//! substituted into arguments and exported to the child:
//!
//! | Variable              | Value                                   |
//! |-----------------------|-----------------------------------------|
//! | `$PLAYGROUND_INPUT`   | path of the source file                 |
//! | `$PLAYGROUND_OUTPUT`  | path the compiler should write to       |
//! | `$PLAYGROUND_TOKEN`   | request token (epoch milliseconds)      |
//!
//! If no argument mentions `$PLAYGROUND_OUTPUT` the artifact is read from
//! stdout. The child is killed when the attempt is dropped.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tokio::process::Command;

use super::{CompileError, CompileFuture, CompileRequest, Compiler};
use crate::config::CompilerConfig;

const INPUT_VAR: &str = "PLAYGROUND_INPUT";
const OUTPUT_VAR: &str = "PLAYGROUND_OUTPUT";
const TOKEN_VAR: &str = "PLAYGROUND_TOKEN";

/// Runs `command` once per compile request.
#[derive(Debug, Clone)]
pub struct ProcessCompiler {
    inner: Arc<ProcessSpec>,
}

#[derive(Debug)]
struct ProcessSpec {
    command: Vec<String>,
    input_extension: String,
    output_extension: String,
    cwd: Option<PathBuf>,
}

impl ProcessCompiler {
    #[cfg(test)]
    pub fn new(command: Vec<String>) -> Self {
        Self {
            inner: Arc::new(ProcessSpec {
                command,
                input_extension: "tb".into(),
                output_extension: "ics".into(),
                cwd: None,
            }),
        }
    }

    pub fn from_config(config: &CompilerConfig, root: &Path) -> Self {
        Self {
            inner: Arc::new(ProcessSpec {
                command: config.command.clone(),
                input_extension: config.input_extension.clone(),
                output_extension: config.output_extension.clone(),
                cwd: Some(root.to_path_buf()),
            }),
        }
    }

    /// Display name for logging (the program, `command[0]`).
    pub fn program(&self) -> &str {
        self.inner
            .command
            .first()
            .map(String::as_str)
            .unwrap_or("compiler")
    }
}

impl Compiler for ProcessCompiler {
    fn compile(&self, request: CompileRequest) -> CompileFuture {
        let spec = Arc::clone(&self.inner);
        Box::pin(async move { spec.run(request).await })
    }
}

impl ProcessSpec {
    async fn run(&self, request: CompileRequest) -> Result<String, CompileError> {
        let scratch = tempfile::Builder::new().prefix("tbplay-").tempdir()?;
        let input = scratch
            .path()
            .join(format!("input.{}", self.input_extension));
        let output = scratch
            .path()
            .join(format!("output.{}", self.output_extension));
        tokio::fs::write(&input, request.source.as_bytes()).await?;

        let vars = build_vars(&input, &output, request.token);
        let resolved = resolve_args(&self.command, &vars);
        let Some((program, args)) = resolved.split_first() else {
            return Err(CompileError::Rejected("compiler command is empty".into()));
        };

        let mut cmd = Command::new(program);
        cmd.args(args)
            .envs(&vars)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }

        let child = cmd.spawn().map_err(|source| CompileError::Spawn {
            program: program.clone(),
            source,
        })?;
        let finished = child.wait_with_output().await?;

        if !finished.status.success() {
            return Err(CompileError::Exited {
                code: finished.status.code(),
                stderr: String::from_utf8_lossy(&finished.stderr).trim().to_string(),
            });
        }

        if self.writes_output_file() {
            match tokio::fs::read(&output).await {
                Ok(bytes) => String::from_utf8(bytes).map_err(|_| CompileError::NotUtf8),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(CompileError::NoArtifact),
                Err(e) => Err(e.into()),
            }
        } else {
            String::from_utf8(finished.stdout).map_err(|_| CompileError::NotUtf8)
        }
    }

    fn writes_output_file(&self) -> bool {
        let pattern = format!("${OUTPUT_VAR}");
        self.command.iter().any(|arg| arg.contains(&pattern))
    }
}

/// Build the `$PLAYGROUND_*` variables for one attempt.
fn build_vars(input: &Path, output: &Path, token: i64) -> FxHashMap<String, String> {
    let mut vars = FxHashMap::default();
    vars.insert(INPUT_VAR.into(), input.display().to_string());
    vars.insert(OUTPUT_VAR.into(), output.display().to_string());
    vars.insert(TOKEN_VAR.into(), token.to_string());
    vars
}

/// Replace `$PLAYGROUND_XXX` occurrences in each argument.
fn resolve_args(args: &[String], vars: &FxHashMap<String, String>) -> Vec<String> {
    args.iter()
        .map(|arg| {
            let mut result = arg.clone();
            for (key, value) in vars {
                result = result.replace(&format!("${key}"), value);
            }
            result
        })
        .collect()
}
