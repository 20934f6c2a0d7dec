pub mod archive;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod extract;
pub mod link;
pub mod model;
pub mod pipeline;

#[cfg(test)]
pub mod testutil;

use std::io::Write;

use anyhow::Result;

use catalog::{print_summary, write_catalog};
use cli::Args;
use config::load_config;
use error::ExitCode;
use pipeline::build_catalog;

/// Build the catalog. Returns the exit code: 0 = written, 2 = unresolved
/// references under `--strict`, or the code of the first language skipped
/// under `--keep-going`.
pub fn run(args: Args) -> Result<i32> {
    let mut config = load_config(args.config.as_deref())?;
    config.apply_args(&args);

    match config.config_path() {
        Some(path) => tracing::debug!(path = %path.display(), "config loaded"),
        None => tracing::debug!("no config file found, using defaults"),
    }
    tracing::debug!(
        languages = ?config.languages,
        lib_dir = %config.engine.lib_dir.display(),
        version = %config.engine.version,
        "cataloging"
    );

    let outcome = build_catalog(&config, args.keep_going)?;
    let catalog = outcome.catalog;

    if args.stdout {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        catalog.write_json(&mut lock)?;
        lock.flush()?;
    } else {
        write_catalog(&catalog, &config.output)?;
    }

    if args.summary {
        // Keep stdout pure JSON when the catalog goes there.
        if args.stdout {
            print_summary(&catalog, &mut std::io::stderr().lock())?;
        } else {
            print_summary(&catalog, &mut std::io::stdout().lock())?;
        }
    }

    if let Some(failure) = outcome.failures.first() {
        return Ok(failure.error.exit_code().code());
    }
    if args.strict && !catalog.diagnostics.is_empty() {
        eprintln!(
            "{} unresolved reference(s); failing because of --strict",
            catalog.diagnostics.len()
        );
        return Ok(ExitCode::StrictWarnings.code());
    }
    Ok(ExitCode::Success.code())
}
