//! Logging configuration and initialization

use crate::config::EngineConfig;
use anyhow::{anyhow, Result};
use tracing::debug;

/// Initialize tracing with a filter derived from the configured verbosity
///
/// Fails instead of panicking when a global subscriber is already set, so
/// hosts that install their own subscriber can ignore the error.
pub fn init_logging(config: &EngineConfig) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(config.log_level())
        .with_target(config.verbose >= 2) // Show target module for -vv and above
        .with_line_number(config.verbose >= 3) // Show line numbers for -vvv
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    debug!("stepmaker logging enabled at verbosity {}", config.verbose);
    Ok(())
}
