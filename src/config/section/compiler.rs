//! `[compiler]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [compiler]
//! command = ["timeblok", "$PLAYGROUND_INPUT", "-f", "$PLAYGROUND_OUTPUT"]
//! input_extension = "tb"
//! output_extension = "ics"
//! ```
//!
//! Without `$PLAYGROUND_OUTPUT` in `command`, the artifact is read from stdout.

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;

/// External compiler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Command and arguments. Supports `$PLAYGROUND_*` substitution.
    pub command: Vec<String>,

    /// Extension of the scratch source file.
    pub input_extension: String,

    /// Extension of the scratch output file; the compiler may infer its
    /// output format from it.
    pub output_extension: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            command: vec![
                "timeblok".into(),
                "$PLAYGROUND_INPUT".into(),
                "-f".into(),
                "$PLAYGROUND_OUTPUT".into(),
            ],
            input_extension: "tb".into(),
            output_extension: "ics".into(),
        }
    }
}

impl CompilerConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        let Some(cmd) = self.command.first() else {
            diag.error("compiler.command", "must name a program");
            return;
        };

        if which::which(cmd).is_err() {
            diag.error_with_hint(
                "compiler.command",
                format!("`{cmd}` not found"),
                "install the timeblok CLI or point compiler.command at another compiler",
            );
        }

        for (field, ext) in [
            ("compiler.input_extension", &self.input_extension),
            ("compiler.output_extension", &self.output_extension),
        ] {
            if ext.is_empty() || ext.contains(['/', '\\', '.']) {
                diag.error(field, format!("`{ext}` is not a bare file extension"));
            }
        }
    }
}
