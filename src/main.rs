use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pmd_cataloger::cli::Args;
use pmd_cataloger::error::{ExitCode, exit_code_for};

fn main() {
    // Usage errors exit 3; clap's own code (2) means strict warnings here.
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            process::exit(ExitCode::Failure.code());
        }
    };

    let default_level = if args.debug { "pmd_cataloger=debug" } else { "pmd_cataloger=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match pmd_cataloger::run(args) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            process::exit(exit_code_for(&e));
        }
    }
}
