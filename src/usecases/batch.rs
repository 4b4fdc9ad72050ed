//! Settlement Batch - JSON-lines Bet Settlement Job
//!
//! Settles a stream of bets, one JSON object per line, for the
//! settlement job that runs once race results are in. A bad line or a
//! failing bet is reported on its own outcome; the run carries on.
//!
//! Batch flow:
//! 1. Parse each line into a `BatchItem`
//! 2. Settle it through `BetCalculator`
//! 3. Score the price taken against closing prices, when supplied
//! 4. Aggregate stakes and returns across settled bets
//! 5. Optionally append the report to a daily JSONL file

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::RoundingStrategy;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::bet::{SettlementRequest, SettlementResult};
use crate::domain::odds;
use crate::domain::settlement::SettlementEvaluator;
use crate::usecases::calculator::BetCalculator;

/// One bet in a batch input file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
  /// Caller's bet reference; generated when absent.
  #[serde(default = "new_bet_id")]
  pub bet_id: String,
  pub request: SettlementRequest,
  /// Closing (starting) price of each selection, in the request's notation.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub closing_odds: Option<Vec<String>>,
}

fn new_bet_id() -> String {
  Uuid::new_v4().to_string()
}

/// Outcome of settling a single batch item.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
  /// Bet reference (or `line-N` when the line could not be parsed).
  pub bet_id: String,
  /// 1-based line number in the input.
  pub line: usize,
  /// Whether the bet settled.
  pub success: bool,
  /// Settled result, rounded for display.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub result: Option<SettlementResult>,
  /// Percentage by which the price taken beat the closing price.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub closing_line_value: Option<Decimal>,
  /// Error message if settlement failed.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

impl BatchOutcome {
  fn failed(bet_id: String, line: usize, error: String) -> Self {
    Self {
      bet_id,
      line,
      success: false,
      result: None,
      closing_line_value: None,
      error: Some(error),
    }
  }
}

/// Aggregated report from a batch run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
  /// Individual outcomes in input order.
  pub outcomes: Vec<BatchOutcome>,
  /// Number of bets settled.
  pub settled: usize,
  /// Number of bets that failed.
  pub failed: usize,
  /// Stake across settled bets.
  pub total_stake: Decimal,
  /// Returns across settled bets.
  pub total_returns: Decimal,
  /// Profit across settled bets.
  pub total_profit: Decimal,
  /// Time the report was produced.
  pub generated_at: DateTime<Utc>,
}

/// Batch settlement job.
pub struct SettlementBatch {
  calculator: BetCalculator,
  /// Decimal places money is rounded to in the report.
  display_decimal_places: u32,
}

impl SettlementBatch {
  /// Create a batch job rounding money to pennies.
  pub fn new(calculator: BetCalculator) -> Self {
    Self {
      calculator,
      display_decimal_places: 2,
    }
  }

  /// Create with a custom display precision.
  pub fn with_config(calculator: BetCalculator, display_decimal_places: u32) -> Self {
    Self {
      calculator,
      display_decimal_places,
    }
  }

  /// Settle every bet in a JSON-lines file.
  ///
  /// # Errors
  /// Fails only if the file cannot be opened or read.
  pub fn run_file(&self, path: &Path) -> Result<BatchReport> {
    let file = File::open(path)
      .with_context(|| format!("Failed to open batch file: {}", path.display()))?;
    self.run(BufReader::new(file))
  }

  /// Settle every bet from a JSON-lines reader. Blank lines are skipped.
  ///
  /// # Errors
  /// Fails only on I/O errors; bad lines become failed outcomes.
  #[instrument(skip(self, reader))]
  pub fn run<R: BufRead>(&self, reader: R) -> Result<BatchReport> {
    let mut outcomes = Vec::new();
    let mut total_stake = Decimal::ZERO;
    let mut total_returns = Decimal::ZERO;

    for (index, line) in reader.lines().enumerate() {
      let line_no = index + 1;
      let line = line.with_context(|| format!("Failed to read batch line {line_no}"))?;
      if line.trim().is_empty() {
        continue;
      }

      let item: BatchItem = match serde_json::from_str(&line) {
        Ok(item) => item,
        Err(e) => {
          warn!(line = line_no, error = %e, "Skipping unparsable batch line");
          outcomes.push(BatchOutcome::failed(
            format!("line-{line_no}"),
            line_no,
            format!("Invalid bet JSON: {e}"),
          ));
          continue;
        }
      };

      let outcome = self.settle_item(&item, line_no, &mut total_stake, &mut total_returns);
      outcomes.push(outcome);
    }

    let settled = outcomes.iter().filter(|o| o.success).count();
    let failed = outcomes.len() - settled;

    let report = BatchReport {
      outcomes,
      settled,
      failed,
      total_stake: self.round(total_stake),
      total_returns: self.round(total_returns),
      total_profit: self.round(total_returns - total_stake),
      generated_at: Utc::now(),
    };

    info!(
      settled = report.settled,
      failed = report.failed,
      total_stake = %report.total_stake,
      total_returns = %report.total_returns,
      total_profit = %report.total_profit,
      "Batch settlement complete"
    );

    Ok(report)
  }

  /// Settle one item, folding its exact totals into the running sums.
  fn settle_item(
    &self,
    item: &BatchItem,
    line: usize,
    total_stake: &mut Decimal,
    total_returns: &mut Decimal,
  ) -> BatchOutcome {
    let result = match self.calculator.settle(&item.request) {
      Ok(result) => result,
      Err(e) => {
        warn!(
          bet_id = %item.bet_id,
          error = %e,
          defect = !e.is_user_error(),
          "Bet settlement failed"
        );
        return BatchOutcome::failed(item.bet_id.clone(), line, e.to_string());
      }
    };

    let closing_line_value = match score_closing_line(item) {
      Ok(clv) => clv,
      Err(e) => {
        warn!(bet_id = %item.bet_id, error = %e, "Invalid closing odds");
        return BatchOutcome::failed(item.bet_id.clone(), line, format!("{e:#}"));
      }
    };

    let (Some(stake), Some(returns)) = (
      total_stake.checked_add(result.total_stake),
      total_returns.checked_add(result.total_returns),
    ) else {
      warn!(bet_id = %item.bet_id, "Bet would overflow batch totals");
      return BatchOutcome::failed(
        item.bet_id.clone(),
        line,
        "Arithmetic overflow computing batch totals".to_string(),
      );
    };
    *total_stake = stake;
    *total_returns = returns;

    debug!(
      bet_id = %item.bet_id,
      bet_type = %result.bet_type,
      lines = result.sub_bets.len(),
      winners = result.winning_sub_bet_count,
      returns = %result.total_returns,
      clv = ?closing_line_value,
      "Bet settled"
    );

    BatchOutcome {
      bet_id: item.bet_id.clone(),
      line,
      success: true,
      result: Some(result.rounded(self.display_decimal_places)),
      closing_line_value,
      error: None,
    }
  }

  fn round(&self, value: Decimal) -> Decimal {
    value.round_dp_with_strategy(self.display_decimal_places, RoundingStrategy::MidpointAwayFromZero)
  }
}

/// Closing line value of a bet: Rule 4 adjusted price taken against the
/// closing price, both combined across every selection.
///
/// `None` when the item carries no closing prices.
fn score_closing_line(item: &BatchItem) -> Result<Option<Decimal>> {
  let Some(closing) = &item.closing_odds else {
    return Ok(None);
  };
  let request = &item.request;
  anyhow::ensure!(
    closing.len() == request.selections.len(),
    "closingOdds has {} prices for {} selections",
    closing.len(),
    request.selections.len()
  );

  let evaluator = SettlementEvaluator::new(request.odds_notation, request.rule4_percent, None);
  let taken = odds::combined_price(
    evaluator
      .price_legs(&request.selections)?
      .iter()
      .map(|leg| leg.adjusted_odds),
  )?;
  let closing = odds::combined_price(
    closing
      .iter()
      .map(|literal| odds::to_decimal(literal, request.odds_notation))
      .collect::<Result<Vec<_>, _>>()
      .context("Invalid closing odds")?,
  )?;

  Ok(odds::closing_line_value(taken, closing))
}

/// Append a report to `<dir>/settlements-YYYY-MM-DD.jsonl`.
///
/// Returns the path written.
///
/// # Errors
/// Fails if the directory cannot be created or the file written.
#[instrument(skip(report), fields(settled = report.settled, failed = report.failed))]
pub fn write_report(report: &BatchReport, dir: &Path) -> Result<PathBuf> {
  fs::create_dir_all(dir)
    .with_context(|| format!("Failed to create report directory: {}", dir.display()))?;

  let date = report.generated_at.format("%Y-%m-%d");
  let path = dir.join(format!("settlements-{date}.jsonl"));

  let mut json = serde_json::to_string(report).context("Failed to serialize batch report")?;
  json.push('\n');

  let mut file = OpenOptions::new()
    .create(true)
    .append(true)
    .open(&path)
    .with_context(|| format!("Failed to open report file: {}", path.display()))?;
  file
    .write_all(json.as_bytes())
    .context("Failed to write batch report")?;

  info!(path = %path.display(), "Batch report written");
  Ok(path)
}
