//! Racing Bet Settler — Entry Point
//!
//! Command-line front end for the settlement engine. Results go to
//! stdout as JSON; logs go to stderr.
//!
//! Wiring sequence:
//! 1. Parse CLI arguments
//! 2. Load config.toml (or defaults) + validate
//! 3. Init tracing (human-readable or JSON structured logging)
//! 4. Dispatch the subcommand

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use racing_bet_settler::config::{self, AppConfig};
use racing_bet_settler::domain::odds::{self, OddsNotation};
use racing_bet_settler::domain::{CATALOG, SettlementRequest};
use racing_bet_settler::usecases::{BetCalculator, SettlementBatch, write_report};

/// Multi-way horse racing bet settlement.
#[derive(Debug, Parser)]
#[clap(version, about)]
struct Cli {
    /// Path to config.toml. Defaults apply when omitted.
    #[arg(long, env = "BET_SETTLER_CONFIG")]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Settle one bet from a JSON request file.
    Settle {
        /// Request JSON file.
        request: PathBuf,
    },
    /// Settle a JSON-lines file of bets and print the report.
    Batch {
        /// JSON-lines input, one `{ "betId", "request", "closingOdds"? }` object per line.
        input: PathBuf,
        /// Also append the report to the configured report directory.
        #[arg(long)]
        write: bool,
    },
    /// List every supported bet type.
    Catalog,
    /// Convert an odds literal between notations.
    Convert {
        /// Odds literal, e.g. 11/4 or 3.75.
        literal: String,
        #[arg(long, default_value = "fractional")]
        from: OddsNotation,
        #[arg(long, default_value = "decimal")]
        to: OddsNotation,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── 1. Load configuration ───────────────────────────────
    let config = match &cli.config {
        Some(path) => config::loader::load_config(path).context("Failed to load configuration")?,
        None => AppConfig::default(),
    };

    // ── 2. Initialize logging ───────────────────────────────
    init_tracing(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        parallel_folds = config.engine.parallel_folds,
        "Starting racing bet settler"
    );

    // ── 3. Dispatch ─────────────────────────────────────────
    if let Err(e) = run(cli.command, &config) {
        error!(error = %e, "Command failed");
        return Err(e);
    }
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(command: Command, config: &AppConfig) -> Result<()> {
    let calculator = BetCalculator::new(config.engine.calculator());
    let dp = config.engine.display_decimal_places;

    match command {
        Command::Settle { request } => {
            let content = std::fs::read_to_string(&request)
                .with_context(|| format!("Failed to read request file: {}", request.display()))?;
            let request: SettlementRequest =
                serde_json::from_str(&content).context("Failed to parse settlement request")?;

            let result = calculator.settle(&request)?;
            info!(
                bet_type = %result.bet_type,
                lines = result.sub_bets.len(),
                winners = result.winning_sub_bet_count,
                profit = %result.total_profit,
                "Bet settled"
            );
            print_json(&result.rounded(dp))
        }
        Command::Batch { input, write } => {
            let report = SettlementBatch::with_config(calculator, dp).run_file(&input)?;
            if write {
                write_report(&report, Path::new(&config.batch.report_dir))?;
            }
            print_json(&report)
        }
        Command::Catalog => {
            for def in &CATALOG {
                let cover = if def.includes_singles() { "with singles" } else { "multiples only" };
                println!(
                    "{:<12} {:<12} selections={} lines={} ({cover})",
                    def.key, def.name, def.required_selection_count, def.expected_sub_bet_count
                );
            }
            Ok(())
        }
        Command::Convert { literal, from, to } => {
            println!("{}", odds::convert_literal(&literal, from, to)?);
            Ok(())
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}
