//! Command implementations for the MonRaS importer CLI.
//!
//! Each command lives in its own module; shared plumbing (logging setup,
//! configuration resolution) sits in `shared`.

pub mod analyze;
pub mod import;
pub mod shared;

use crate::cli::args::{Args, Commands};
use crate::Result;

/// Dispatch to the appropriate subcommand handler.
///
/// Invoking the binary without a subcommand runs the import, which is the
/// pipeline's whole contract; `analyze` is a read-only convenience.
pub fn run(args: Args) -> Result<()> {
    match args.get_command() {
        Some(Commands::Import(import_args)) => import::run_import(import_args),
        Some(Commands::Analyze(analyze_args)) => analyze::run_analyze(analyze_args),
        None => import::run_import(crate::cli::args::ImportArgs {
            config_file: None,
            verbose: 0,
            quiet: false,
        }),
    }
}
