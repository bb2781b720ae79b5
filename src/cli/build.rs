//! Build command implementation

use std::path::Path;
use std::process::ExitCode;

use super::{EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};
use crate::builder::{BuildError, Builder};
use crate::config::loader::{find_config, load_config, resolve_path};
use crate::config::BuildlineConfig;
use crate::engine::ManifestEngine;
use crate::settings::BuildTarget;

/// Assemble the full token list for a run. The registry applies every
/// matching token in sequence and the last write wins, so the config
/// baseline comes first, flags next and explicit command-line tokens last.
fn assemble_tokens(
    config: &BuildlineConfig,
    target: Option<&str>,
    dry_run: bool,
    options: &[String],
) -> Vec<String> {
    let mut tokens = config.baseline_tokens();
    if let Some(t) = target {
        tokens.push(format!("-switchBuildTarget={}", t));
    }
    if dry_run {
        tokens.push("-dryRun=true".to_string());
    }
    tokens.extend(options.iter().cloned());
    tokens
}

/// Run the build command
pub fn run_build(
    config_path: Option<&Path>,
    root: Option<&Path>,
    target: Option<&str>,
    dry_run: bool,
    verbose: bool,
    options: &[String],
) -> ExitCode {
    // Find config file path and determine project root
    let found = config_path.map(|p| p.to_path_buf()).or_else(find_config);
    let (config, project_root) = match found {
        Some(path) => {
            if verbose {
                println!("Using config: {}", path.display());
            }
            let cfg = match load_config(Some(&path)) {
                Ok(cfg) => cfg,
                Err(e) => {
                    eprintln!("Error loading config: {}", e);
                    return ExitCode::from(EXIT_ERROR);
                }
            };
            let root = root
                .map(|p| p.to_path_buf())
                .or_else(|| path.parent().map(|p| p.to_path_buf()))
                .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
            (cfg, root)
        }
        None => {
            if verbose {
                println!("No buildline.toml found, using defaults");
            }
            let root = root
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
            (crate::config::loader::default_config(), root)
        }
    };

    if let Some(t) = target {
        if BuildTarget::parse(t).is_none() {
            eprintln!("Error: unknown build target '{}'", t);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    }

    let tokens = assemble_tokens(&config, target, dry_run, options);

    let mut engine = ManifestEngine::new();
    if let Some(ref settings) = config.project.settings_file {
        engine = engine.with_settings_path(resolve_path(&project_root, settings));
    }

    let builder = Builder::with_default_steps()
        .project_root(project_root)
        .verbose(verbose);

    match builder.build_game(&tokens, &mut engine) {
        Ok(outcome) => {
            match outcome.report {
                Some(report) => {
                    println!("Build succeeded: {}", report.output.display());
                    if report.warnings > 0 {
                        println!("  {} warning(s)", report.warnings);
                    }
                }
                None => println!("Build plan resolved, no player produced"),
            }
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Build failed: {}", e);
            match e {
                BuildError::Options(_)
                | BuildError::UnknownStep(_)
                | BuildError::ConflictingStepFilters => ExitCode::from(EXIT_INVALID_ARGS),
                _ => ExitCode::from(EXIT_ERROR),
            }
        }
    }
}
