//! Export: the output panel as a downloadable file.
//!
//! Whatever the panel shows is what gets exported, including the
//! placeholder, `Compiling...`, the advisory message, or `error`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::editor::Editor;
use crate::utils::mime;

/// A captured export: fixed file name plus the panel text as UTF-8 bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl ExportFile {
    /// Capture the output panel as it is right now.
    pub fn snapshot(editor: &Editor, filename: &str) -> Self {
        Self {
            filename: filename.to_string(),
            bytes: editor.output_text().into_bytes(),
        }
    }

    /// Write into `dir` (created if missing), replacing any existing file.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create export directory {}", dir.display()))?;
        let path = dir.join(&self.filename);
        fs::write(&path, &self.bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// `Content-Disposition` value for an HTTP download.
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }

    pub fn content_type(&self) -> &'static str {
        mime::from_filename(&self.filename)
    }
}
