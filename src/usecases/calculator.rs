//! Bet Calculator - Compound Bet Settlement
//!
//! Settles a whole compound bet (Single through Goliath) by driving
//! the catalog, the combination generator and the fold evaluator.
//!
//! Settlement flow:
//! 1. Resolve the bet type and validate the request
//! 2. Price every selection once (no partial results on a bad literal)
//! 3. Generate and settle each fold size's lines
//! 4. Check the line count against the catalog
//! 5. Sum stakes and returns (checked), build the explanation

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::bet::{SettlementRequest, SettlementResult, SubBet};
use crate::domain::bet_type::{self, BetTypeDefinition};
use crate::domain::combinations::combinations;
use crate::domain::error::SettlementError;
use crate::domain::fold_name;
use crate::domain::settlement::{PricedLeg, SettlementEvaluator};

/// Largest Rule 4 deduction a bookmaker applies, in percent.
pub const MAX_RULE4_PERCENT: Decimal = dec!(90);

/// Calculator tuning.
#[derive(Debug, Clone, Default)]
pub struct CalculatorConfig {
  /// Settle each fold size on its own scoped thread.
  pub parallel_folds: bool,
}

/// Stateless compound bet calculator.
#[derive(Debug, Clone, Default)]
pub struct BetCalculator {
  config: CalculatorConfig,
}

impl BetCalculator {
  /// Create a calculator with the given configuration.
  pub fn new(config: CalculatorConfig) -> Self {
    Self { config }
  }

  /// Settle a compound bet.
  ///
  /// # Errors
  /// - `UnknownBetType` if the key is not in the catalog
  /// - `SelectionCountMismatch` before any line is generated
  /// - `InvalidStake` for a non-positive stake
  /// - `InvalidRule4` for a deduction outside [0, 90]
  /// - `OddsParse` for any malformed price, even on a losing leg
  /// - `ArithmeticOverflow` if a price, return or total leaves `Decimal` range
  /// - `InternalConsistency` if the generated lines disagree with the catalog
  pub fn settle(&self, request: &SettlementRequest) -> Result<SettlementResult, SettlementError> {
    let definition = bet_type::definition_for(&request.bet_type_key)?;
    validate(request, definition)?;

    let evaluator = SettlementEvaluator::new(
      request.odds_notation,
      request.rule4_percent,
      request.each_way.map(|ew| ew.place_fraction),
    );

    let legs = evaluator.price_legs(&request.selections)?;
    let stake = request.stake_for_line()?;
    let sub_bets = if self.config.parallel_folds && definition.fold_sizes.len() > 1 {
      settle_parallel(definition, &legs, &evaluator, stake)?
    } else {
      settle_sequential(definition, &legs, &evaluator, stake)?
    };

    if sub_bets.len() != definition.expected_sub_bet_count {
      return Err(SettlementError::InternalConsistency {
        bet_type: definition.name.to_string(),
        expected: definition.expected_sub_bet_count,
        actual: sub_bets.len(),
      });
    }

    let total_stake = checked_sum(sub_bets.iter().map(|sb| sb.stake), "total stake")?;
    let total_returns = checked_sum(sub_bets.iter().map(|sb| sb.total_return), "total returns")?;
    let winning_sub_bet_count = sub_bets.iter().filter(|sb| sb.is_winner()).count();
    let explanation = explain(definition, request, sub_bets.len(), winning_sub_bet_count);

    Ok(SettlementResult {
      bet_type: definition.name.to_string(),
      total_stake,
      total_returns,
      total_profit: total_returns - total_stake,
      winning_sub_bet_count,
      sub_bets,
      explanation,
    })
  }
}

/// Check request parameters against the bet type.
fn validate(request: &SettlementRequest, definition: &BetTypeDefinition) -> Result<(), SettlementError> {
  if request.selections.len() != definition.required_selection_count {
    return Err(SettlementError::SelectionCountMismatch {
      bet_type: definition.name.to_string(),
      expected: definition.required_selection_count,
      actual: request.selections.len(),
    });
  }

  if request.stake_per_line <= Decimal::ZERO {
    return Err(SettlementError::InvalidStake(request.stake_per_line));
  }

  if request.rule4_percent < Decimal::ZERO || request.rule4_percent > MAX_RULE4_PERCENT {
    return Err(SettlementError::InvalidRule4(request.rule4_percent));
  }

  Ok(())
}

fn checked_sum(
  mut values: impl Iterator<Item = Decimal>,
  what: &'static str,
) -> Result<Decimal, SettlementError> {
  values
    .try_fold(Decimal::ZERO, Decimal::checked_add)
    .ok_or(SettlementError::ArithmeticOverflow(what))
}

fn settle_sequential(
  definition: &BetTypeDefinition,
  legs: &[PricedLeg<'_>],
  evaluator: &SettlementEvaluator,
  stake: Decimal,
) -> Result<Vec<SubBet>, SettlementError> {
  let mut sub_bets = Vec::with_capacity(definition.expected_sub_bet_count);
  for &size in definition.fold_sizes {
    sub_bets.extend(settle_fold_size(legs, size, evaluator, stake)?);
  }
  Ok(sub_bets)
}

/// One scoped thread per fold size; lines keep catalog order.
fn settle_parallel(
  definition: &BetTypeDefinition,
  legs: &[PricedLeg<'_>],
  evaluator: &SettlementEvaluator,
  stake: Decimal,
) -> Result<Vec<SubBet>, SettlementError> {
  let batches = std::thread::scope(|scope| {
    let handles: Vec<_> = definition
      .fold_sizes
      .iter()
      .map(|&size| scope.spawn(move || settle_fold_size(legs, size, evaluator, stake)))
      .collect();

    handles
      .into_iter()
      .map(|handle| handle.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
      .collect::<Result<Vec<_>, _>>()
  })?;

  Ok(batches.into_iter().flatten().collect())
}

fn settle_fold_size(
  legs: &[PricedLeg<'_>],
  size: usize,
  evaluator: &SettlementEvaluator,
  stake: Decimal,
) -> Result<Vec<SubBet>, SettlementError> {
  combinations(legs, size)
    .into_iter()
    .map(|subset| {
      let ret = evaluator.evaluate(&subset, stake)?;
      Ok(SubBet {
        fold_size: size,
        fold_name: fold_name(size),
        selections: subset.iter().map(|leg| leg.selection.name.clone()).collect(),
        stake,
        win_return: ret.win_return,
        place_return: ret.place_return,
        total_return: ret.total_return,
        profit: ret.profit(stake),
      })
    })
    .collect()
}

/// Descriptive summary of a settled bet. Adds no new numbers.
fn explain(
  definition: &BetTypeDefinition,
  request: &SettlementRequest,
  line_count: usize,
  winners: usize,
) -> String {
  let mut lines = vec![
    format!("{} analysis:", definition.name),
    format!("- Total of {line_count} individual bets placed"),
    format!("- {winners} bets won, {} bets lost", line_count - winners),
  ];

  if let Some(each_way) = request.each_way {
    lines.push("- Each way betting: win and place portions for each bet".to_string());
    match each_way.places_paid {
      Some(places) => lines.push(format!(
        "- Place terms: {} odds for placed horses, {places} places paid",
        each_way.place_fraction
      )),
      None => lines.push(format!(
        "- Place terms: {} odds for placed horses",
        each_way.place_fraction
      )),
    }
  }

  if request.rule4_percent > Decimal::ZERO {
    lines.push(format!(
      "- Rule 4 deduction of {}% applied to all odds",
      request.rule4_percent.normalize()
    ));
  }

  let results = request
    .selections
    .iter()
    .map(|sel| format!("{}: {}", sel.name, sel.outcome))
    .collect::<Vec<_>>()
    .join(", ");
  lines.push(format!("- Horse results: {results}"));

  lines.join("\n")
}
