//! Playground configuration management for `playground.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # [workflow], [compiler], [serve], [export]
//! ├── error          # ConfigError, ConfigDiagnostics
//! └── mod.rs         # PlaygroundConfig (this file)
//! ```
//!
//! The file is optional: without one every section takes its defaults.
//! CLI flags override whatever the file says.

mod error;
pub mod section;

pub use error::{ConfigDiagnostics, ConfigError};
pub use section::{
    CompilerConfig, ExportConfig, OverlapPolicy, ServeConfig, WatchdogMode, WorkflowConfig,
};

use crate::{
    cli::{Cli, Commands, WorkflowArgs},
    debug, log,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Config file looked up when `--config` is not given.
pub const DEFAULT_CONFIG: &str = "playground.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing playground.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaygroundConfig {
    /// Absolute path to the config file, if one was loaded
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Directory relative paths resolve against (config file parent or cwd)
    #[serde(skip)]
    pub root: PathBuf,

    /// Compile workflow settings
    #[serde(default)]
    pub workflow: WorkflowConfig,

    /// External compiler settings
    #[serde(default)]
    pub compiler: CompilerConfig,

    /// Playground server settings
    #[serde(default)]
    pub serve: ServeConfig,

    /// Export settings
    #[serde(default)]
    pub export: ExportConfig,
}

impl PlaygroundConfig {
    /// Load configuration for the parsed command line.
    ///
    /// An explicit `--config` must exist; otherwise `playground.toml` is
    /// searched upward from the current directory and defaults apply when
    /// none is found.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let mut config = match Self::resolve_config_path(cli, &cwd)? {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.root = path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| cwd.clone());
                debug!("config"; "loaded {}", path.display());
                config.config_path = Some(path);
                config
            }
            None => {
                debug!("config"; "no {} found, using defaults", DEFAULT_CONFIG);
                Self {
                    root: cwd,
                    ..Self::default()
                }
            }
        };

        config.apply_command_options(cli);
        config.normalize_paths();
        config.validate()?;
        Ok(config)
    }

    fn resolve_config_path(cli: &Cli, cwd: &Path) -> Result<Option<PathBuf>> {
        match &cli.config {
            Some(path) => {
                let path = if path.is_absolute() {
                    path.clone()
                } else {
                    cwd.join(path)
                };
                if !path.is_file() {
                    let err = std::io::Error::new(std::io::ErrorKind::NotFound, "not found");
                    return Err(ConfigError::Io(path, err).into());
                }
                Ok(Some(path))
            }
            None => Ok(find_config_file(cwd, Path::new(DEFAULT_CONFIG))),
        }
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Join a path with the root directory.
    pub fn root_join(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root.join(path)
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command-specific configuration options.
    fn apply_command_options(&mut self, cli: &Cli) {
        if cli.verbose {
            crate::logger::set_verbose(true);
        }

        match &cli.command {
            Commands::Serve {
                workflow,
                interface,
                port,
            } => {
                self.apply_workflow_args(workflow);
                Self::update_option(&mut self.serve.interface, interface.as_ref());
                Self::update_option(&mut self.serve.port, port.as_ref());
            }
            Commands::Compile { args } => {
                self.apply_workflow_args(&args.workflow);
            }
        }
    }

    fn apply_workflow_args(&mut self, args: &WorkflowArgs) {
        Self::update_option(&mut self.workflow.watchdog_ms, args.watchdog_ms.as_ref());
        if args.advisory {
            self.workflow.watchdog = WatchdogMode::Advisory;
        }
        if args.detailed_errors {
            self.workflow.detailed_errors = true;
        }
    }

    /// Overwrite `target` when the CLI supplied a value.
    fn update_option<T: Clone>(target: &mut T, value: Option<&T>) {
        if let Some(v) = value {
            *target = v.clone();
        }
    }

    /// Expand `~` and resolve relative paths against the root.
    fn normalize_paths(&mut self) {
        let raw = self.export.dir.to_string_lossy().into_owned();
        let expanded = PathBuf::from(shellexpand::tilde(&raw).into_owned());
        self.export.dir = if expanded.is_relative() {
            self.root_join(expanded)
        } else {
            expanded
        };
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate all sections, reporting every problem at once.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.workflow.validate(&mut diag);
        self.compiler.validate(&mut diag);
        self.export.validate(&mut diag);

        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }
}

/// Find config file by searching upward from `start`.
///
/// ```text
/// /home/user/blok/notes/   ← cwd
/// /home/user/blok/playground.toml  ← found!
/// ```
fn find_config_file(start: &Path, config_name: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        let candidate = current.join(config_name);
        if candidate.is_file() {
            return Some(candidate);
        }
        current = current.parent()?;
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse a config snippet. Panics on unknown fields to catch typos in tests.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> PlaygroundConfig {
    let (parsed, ignored) = PlaygroundConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
