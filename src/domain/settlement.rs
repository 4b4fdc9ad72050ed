//! Fold settlement.
//!
//! Settles a single line (a fold over a subset of selections) under the
//! bet's odds notation, Rule 4 deduction and optional each-way terms.
//! Selections are priced once per bet; lines only multiply prices.
//!
//! Rules per line:
//! - Win part pays stake * product of Rule 4 adjusted odds if every leg won.
//! - Place part (each-way only) pays stake * product of place odds if every
//!   leg won or placed. A line where every leg won collects both parts.
//! - Anything else returns nothing.

use rust_decimal::Decimal;
use serde::Serialize;

use super::bet::{Outcome, PlaceFraction, Selection};
use super::error::SettlementError;
use super::odds::{self, OddsNotation};

/// Returns of one settled line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FoldReturn {
    pub win_return: Decimal,
    pub place_return: Decimal,
    pub total_return: Decimal,
}

impl FoldReturn {
    /// Total return less the line stake.
    pub fn profit(&self, stake_for_line: Decimal) -> Decimal {
        self.total_return - stake_for_line
    }
}

/// A selection with its price parsed and Rule 4 applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLeg<'a> {
    pub selection: &'a Selection,
    pub adjusted_odds: Decimal,
}

/// Settles folds under one set of bet terms.
#[derive(Debug, Clone)]
pub struct SettlementEvaluator {
    notation: OddsNotation,
    rule4_percent: Decimal,
    /// Place fraction as a decimal, when the bet is each-way.
    place_fraction: Option<Decimal>,
}

impl SettlementEvaluator {
    /// Creates an evaluator. `rule4_percent` is expected in [0, 90];
    /// range checking is the caller's job.
    pub fn new(
        notation: OddsNotation,
        rule4_percent: Decimal,
        each_way: Option<PlaceFraction>,
    ) -> Self {
        Self {
            notation,
            rule4_percent,
            place_fraction: each_way.map(|pf| pf.as_decimal()),
        }
    }

    /// Decimal odds of a selection after the Rule 4 deduction.
    ///
    /// # Errors
    /// Returns `SettlementError::OddsParse` for a malformed literal and
    /// `ArithmeticOverflow` for a price out of range.
    pub fn adjusted_odds(&self, selection: &Selection) -> Result<Decimal, SettlementError> {
        let decimal = odds::to_decimal(&selection.odds_literal, self.notation)?;
        odds::rule4_adjusted(decimal, self.rule4_percent)
    }

    /// Prices every selection, in input order.
    ///
    /// # Errors
    /// Fails on the first selection whose price does not parse, whatever
    /// its outcome.
    pub fn price_legs<'a>(
        &self,
        selections: &'a [Selection],
    ) -> Result<Vec<PricedLeg<'a>>, SettlementError> {
        selections
            .iter()
            .map(|selection| {
                Ok(PricedLeg {
                    selection,
                    adjusted_odds: self.adjusted_odds(selection)?,
                })
            })
            .collect()
    }

    /// Settles one fold.
    ///
    /// # Errors
    /// Returns `SettlementError::ArithmeticOverflow` if a return exceeds the
    /// representable range.
    pub fn evaluate(
        &self,
        legs: &[&PricedLeg<'_>],
        stake_for_line: Decimal,
    ) -> Result<FoldReturn, SettlementError> {
        let all_win = legs.iter().all(|leg| leg.selection.outcome == Outcome::Win);
        let all_placed = legs.iter().all(|leg| leg.selection.outcome.is_placed());

        let win_return = if all_win {
            legs.iter()
                .try_fold(stake_for_line, |acc, leg| acc.checked_mul(leg.adjusted_odds))
                .ok_or(SettlementError::ArithmeticOverflow("win return"))?
        } else {
            Decimal::ZERO
        };

        let place_return = match self.place_fraction {
            Some(fraction) if all_placed => legs.iter().try_fold(stake_for_line, |acc, leg| {
                acc.checked_mul(odds::place_odds(leg.adjusted_odds, fraction)?)
                    .ok_or(SettlementError::ArithmeticOverflow("place return"))
            })?,
            _ => Decimal::ZERO,
        };

        let total_return = win_return
            .checked_add(place_return)
            .ok_or(SettlementError::ArithmeticOverflow("line return"))?;

        Ok(FoldReturn {
            win_return,
            place_return,
            total_return,
        })
    }
}
