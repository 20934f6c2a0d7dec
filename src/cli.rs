use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "pmd-cataloger",
    version,
    about = "Catalog the rules, categories and rulesets shipped in PMD's language archives"
)]
pub struct Args {
    /// Path to configuration file [default: cataloger.yml]
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Engine version used to derive archive names (e.g. 6.20.0)
    #[arg(long, value_name = "VERSION")]
    pub engine_version: Option<String>,

    /// Directory holding the per-language rule archives
    #[arg(long, value_name = "DIR")]
    pub lib_dir: Option<PathBuf>,

    /// Languages to catalog (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub languages: Vec<String>,

    /// Where to write the catalog JSON
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Skip languages that fail instead of aborting the run
    #[arg(long)]
    pub keep_going: bool,

    /// Exit with code 2 if any reference could not be resolved
    #[arg(long)]
    pub strict: bool,

    /// Print per-language counts after cataloging
    #[arg(long)]
    pub summary: bool,

    /// Print the catalog JSON to stdout instead of writing the output file
    #[arg(long)]
    pub stdout: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,
}
