//! glowd binary entry point.

use std::process::ExitCode;

use clap::Parser;

fn main() -> ExitCode {
    let cli = glowd::cli_app::Cli::parse();
    if let Err(err) = glowd::logging::init() {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }
    if let Err(err) = glowd::cli_app::run(&cli) {
        tracing::error!(code = err.code(), %err, "daemon failed");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
