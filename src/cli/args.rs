//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

/// Timeblok playground: edit, compile, and export timeblok programs
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: playground.toml, searched upward)
    #[arg(short = 'C', long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Print debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Serve the playground page over HTTP
    #[command(visible_alias = "s")]
    Serve {
        #[command(flatten)]
        workflow: WorkflowArgs,

        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(short, long)]
        interface: Option<IpAddr>,

        /// Port number to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Compile one file through the workflow and print the result
    #[command(visible_alias = "c")]
    Compile {
        #[command(flatten)]
        args: CompileArgs,
    },
}

/// Compile command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct CompileArgs {
    /// Timeblok source file. Use `-` to read from stdin.
    #[arg(value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub input: PathBuf,

    /// Write the export file into DIR (default: export.dir from config)
    #[arg(short, long, value_name = "DIR", num_args = 0..=1, value_hint = clap::ValueHint::DirPath)]
    pub export: Option<Option<PathBuf>>,

    #[command(flatten)]
    pub workflow: WorkflowArgs,
}

/// Workflow overrides shared by Serve and Compile
#[derive(clap::Args, Debug, Clone)]
pub struct WorkflowArgs {
    /// Watchdog deadline in milliseconds
    #[arg(short, long, value_name = "MS")]
    pub watchdog_ms: Option<u64>,

    /// Let a slow compile keep running after the watchdog fires
    #[arg(short, long)]
    pub advisory: bool,

    /// Show the failure reason next to `error`
    #[arg(short, long)]
    pub detailed_errors: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_export_without_dir() {
        let cli = Cli::parse_from(["tbplay", "compile", "notes.tb", "--export"]);
        let Commands::Compile { args } = cli.command else {
            panic!("expected compile");
        };
        assert_eq!(args.input, PathBuf::from("notes.tb"));
        assert_eq!(args.export, Some(None));
    }

    #[test]
    fn test_compile_export_with_dir() {
        let cli = Cli::parse_from(["tbplay", "compile", "-", "-e", "out"]);
        let Commands::Compile { args } = cli.command else {
            panic!("expected compile");
        };
        assert_eq!(args.input, PathBuf::from("-"));
        assert_eq!(args.export, Some(Some(PathBuf::from("out"))));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["tbplay", "serve", "-p", "8080", "--verbose", "-C", "pg.toml"]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("pg.toml")));
        let Commands::Serve { port, workflow, .. } = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(port, Some(8080));
        assert!(!workflow.advisory);
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
