//! tbplay - a compile-and-export playground for timeblok programs.

mod actor;
mod cli;
mod compiler;
mod config;
mod core;
mod editor;
mod embed;
mod export;
mod logger;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::PlaygroundConfig;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = PlaygroundConfig::load(&cli)?;

    match &cli.command {
        Commands::Serve { .. } => cli::serve::serve(&config),
        Commands::Compile { args } => {
            if !cli::compile::run_compile(args, &config)? {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}
