//! Import command implementation.

use crate::cli::args::ImportArgs;
use crate::cli::commands::shared::{load_configuration, setup_logging};
use crate::processor::ImportProcessor;
use crate::Result;
use tracing::info;

/// Run the full XLSX to SQLite import.
pub fn run_import(args: ImportArgs) -> Result<()> {
    args.validate()?;
    setup_logging(args.get_log_level(), args.quiet)?;

    let config = load_configuration(args.config_file.as_ref())?;
    let processor = ImportProcessor::new(config);
    let stats = processor.run()?;

    info!(
        files = stats.files_processed,
        failed = stats.files_failed,
        rows = stats.total_rows,
        "Import finished"
    );
    Ok(())
}
