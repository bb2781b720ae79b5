//! Buildline - command-line front end for engine player builds

use std::process::ExitCode;

use buildline::cli;

fn main() -> ExitCode {
    cli::run()
}
