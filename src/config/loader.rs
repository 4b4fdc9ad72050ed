//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;

/// Highest display precision accepted for money amounts.
const MAX_DISPLAY_DECIMAL_PLACES: u32 = 10;

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &Path) -> Result<AppConfig> {
  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)?;

  info!(
    path = %path.display(),
    parallel_folds = config.engine.parallel_folds,
    display_decimal_places = config.engine.display_decimal_places,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration from TOML text.
///
/// # Errors
/// Fails on invalid TOML or values outside their allowed ranges.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig = toml::from_str(content).context("Failed to parse config.toml")?;
  validate_config(&config)?;
  Ok(config)
}

/// Validate all configuration parameters.
fn validate_config(config: &AppConfig) -> Result<()> {
  anyhow::ensure!(
    config.engine.display_decimal_places <= MAX_DISPLAY_DECIMAL_PLACES,
    "display_decimal_places must be at most {}, got {}",
    MAX_DISPLAY_DECIMAL_PLACES,
    config.engine.display_decimal_places
  );

  anyhow::ensure!(
    !config.logging.log_level.trim().is_empty(),
    "log_level must not be empty"
  );

  anyhow::ensure!(
    !config.batch.report_dir.trim().is_empty(),
    "Batch report_dir must not be empty"
  );

  Ok(())
}
