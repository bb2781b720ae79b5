//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod build;
mod steps;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// Buildline - drive engine player builds from the command line
#[derive(Parser)]
#[command(name = "bline")]
#[command(about = "Buildline - ordered build steps and -name=value options for game player builds")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the build pipeline according to buildline.toml and option tokens
    Build {
        /// Path to buildline.toml (default: walk up from the current directory)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Project root (default: directory containing buildline.toml)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Target platform: standalone, ios, android, webgl
        #[arg(short, long)]
        target: Option<String>,

        /// Resolve options and print the plan without invoking the engine
        #[arg(long)]
        dry_run: bool,

        /// Print applied options and step parameters
        #[arg(short, long)]
        verbose: bool,

        /// Build options in -name=value form, e.g. -productName=MyGame
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        options: Vec<String>,
    },

    /// List the build steps in execution order with their options
    Steps {
        /// Also print each option's parameter list
        #[arg(short, long)]
        verbose: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { config, root, target, dry_run, verbose, options } => build::run_build(
            config.as_deref(),
            root.as_deref(),
            target.as_deref(),
            dry_run,
            verbose,
            &options,
        ),
        Commands::Steps { verbose } => steps::run_steps(verbose),
    }
}
