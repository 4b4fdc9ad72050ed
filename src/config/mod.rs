//! Configuration Module - TOML-based Settler Configuration
//!
//! Loads and validates configuration from `config.toml`. Every
//! section has defaults, so an empty file (or no file at all) yields
//! a working configuration. Bet terms never live here: each request
//! carries its own.

pub mod loader;

use serde::Deserialize;

use crate::usecases::calculator::CalculatorConfig;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
  /// Settlement engine tuning.
  #[serde(default)]
  pub engine: EngineConfig,
  /// Logging output.
  #[serde(default)]
  pub logging: LoggingConfig,
  /// Batch settlement job.
  #[serde(default)]
  pub batch: BatchConfig,
}

/// Settlement engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
  /// Settle fold sizes on separate threads.
  #[serde(default)]
  pub parallel_folds: bool,
  /// Decimal places money is rounded to for display.
  #[serde(default = "default_display_decimal_places")]
  pub display_decimal_places: u32,
}

impl EngineConfig {
  /// Calculator settings derived from this section.
  pub fn calculator(&self) -> CalculatorConfig {
    CalculatorConfig {
      parallel_folds: self.parallel_folds,
    }
  }
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      parallel_folds: false,
      display_decimal_places: default_display_decimal_places(),
    }
  }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
  /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins if set.
  #[serde(default = "default_log_level")]
  pub log_level: String,
  /// Emit JSON structured logs instead of human-readable lines.
  #[serde(default)]
  pub json: bool,
}

impl Default for LoggingConfig {
  fn default() -> Self {
    Self {
      log_level: default_log_level(),
      json: false,
    }
  }
}

/// Batch job configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
  /// Directory for daily JSONL settlement reports.
  #[serde(default = "default_report_dir")]
  pub report_dir: String,
}

impl Default for BatchConfig {
  fn default() -> Self {
    Self {
      report_dir: default_report_dir(),
    }
  }
}

// Default value functions for serde

fn default_display_decimal_places() -> u32 {
  2
}

fn default_log_level() -> String {
  "info".to_string()
}

fn default_report_dir() -> String {
  "reports".to_string()
}
