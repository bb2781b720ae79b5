//! Steps command implementation

use std::process::ExitCode;

use super::{EXIT_ERROR, EXIT_SUCCESS};
use crate::ordering::sort_steps;
use crate::steps::{default_steps, PipelineStep};

/// Run the steps listing command
pub fn run_steps(verbose: bool) -> ExitCode {
    let sorted = match sort_steps(default_steps(), Some(PipelineStep::ID)) {
        Ok(sorted) => sorted,
        Err(e) => {
            eprintln!("Error ordering steps: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    println!("Build steps in execution order:");
    for mut step in sorted {
        let mut phases = Vec::new();
        if step.pre_build().is_some() {
            phases.push("pre");
        }
        if step.post_build().is_some() {
            phases.push("post");
        }
        let phases = if phases.is_empty() { "options only".to_string() } else { phases.join("+") };

        println!("  {} ({})", step.kind().id(), phases);

        if verbose {
            for spec in step.options() {
                println!("    -{}", spec.describe());
            }
        }
    }

    ExitCode::from(EXIT_SUCCESS)
}
