//! Shared components for CLI commands.

use crate::config::ImportConfig;
use crate::error::EtlError;
use crate::Result;
use std::path::PathBuf;
use tracing::{debug, info};

/// Set up structured logging to stderr at the requested level.
pub fn setup_logging(log_level: &str, quiet: bool) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("monras_etl={}", log_level)));

    if quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Resolve the configuration document path: the explicit flag wins, else
/// the fixed default location.
pub fn resolve_config_path(explicit: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.clone());
    }
    let default_path = ImportConfig::default_config_path()?;
    if default_path.exists() {
        Ok(default_path)
    } else {
        Err(EtlError::configuration(format!(
            "No configuration found. Pass --config or create {}",
            default_path.display()
        )))
    }
}

/// Load and validate the configuration document.
pub fn load_configuration(explicit: Option<&PathBuf>) -> Result<ImportConfig> {
    let config_path = resolve_config_path(explicit)?;
    info!("Using config file: {}", config_path.display());
    ImportConfig::load(&config_path)
}
