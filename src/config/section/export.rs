//! `[export]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [export]
//! filename = "timeblok.ics"   # Name offered for the download
//! dir = "~/Downloads"         # Where `tbplay compile --export` writes by default
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;

/// Export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Fixed file name of the exported artifact.
    pub filename: String,

    /// Default directory for CLI exports (relative to the config file).
    pub dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            filename: "timeblok.ics".into(),
            dir: PathBuf::from("."),
        }
    }
}

impl ExportConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        let name = self.filename.as_str();
        if name.is_empty() || name == "." || name == ".." {
            diag.error("export.filename", "must be a file name");
        } else if name.contains(['/', '\\', '"']) || name.chars().any(char::is_control) {
            diag.error_with_hint(
                "export.filename",
                format!("`{name}` contains path separators or quotes"),
                "use a plain name such as `timeblok.ics`",
            );
        } else if !name.is_ascii() {
            // Sent verbatim in `Content-Disposition`, which must be ASCII
            diag.error_with_hint(
                "export.filename",
                format!("`{name}` contains non-ASCII characters"),
                "use a plain name such as `timeblok.ics`",
            );
        }
    }
}
