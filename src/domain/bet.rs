//! Bet data model: selections, settlement requests, and their results.
//!
//! A request is built fresh for every calculation and carries everything
//! the engine needs. Results are derived values; nothing here is stored.

use rust_decimal::Decimal;
use rust_decimal::RoundingStrategy;
use serde::{Deserialize, Serialize};

use super::error::SettlementError;
use super::odds::{self, OddsNotation};

// ────────────────────────────────────────────
// Selections
// ────────────────────────────────────────────

/// Settled result of one runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Finished first.
    Win,
    /// Finished within the paid places but did not win.
    Place,
    /// Unplaced.
    Loss,
}

impl Outcome {
    /// Win or place: qualifies for the place part of an each-way bet.
    pub fn is_placed(self) -> bool {
        matches!(self, Self::Win | Self::Place)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Win => write!(f, "WIN"),
            Self::Place => write!(f, "PLACE"),
            Self::Loss => write!(f, "LOSS"),
        }
    }
}

/// One leg of a bet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    /// Horse name, display only.
    pub name: String,
    /// Price in the request's notation.
    pub odds_literal: String,
    pub outcome: Outcome,
}

impl Selection {
    pub fn new(name: impl Into<String>, odds_literal: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            name: name.into(),
            odds_literal: odds_literal.into(),
            outcome,
        }
    }
}

// ────────────────────────────────────────────
// Each-way terms
// ────────────────────────────────────────────

/// Fraction of the win odds paid on the place part, e.g. 1/4.
///
/// Serialized as a `[numerator, denominator]` pair. Both parts must be
/// non-zero; construction and deserialization enforce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[u32; 2]", into = "[u32; 2]")]
pub struct PlaceFraction {
    numerator: u32,
    denominator: u32,
}

impl PlaceFraction {
    /// Creates validated place terms.
    ///
    /// # Errors
    /// Returns `SettlementError::InvalidPlaceTerms` if either part is zero.
    pub fn new(numerator: u32, denominator: u32) -> Result<Self, SettlementError> {
        if numerator == 0 || denominator == 0 {
            return Err(SettlementError::InvalidPlaceTerms {
                numerator,
                denominator,
            });
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    /// The fraction as an exact decimal (1/3 to 28 places).
    pub fn as_decimal(&self) -> Decimal {
        Decimal::from(self.numerator) / Decimal::from(self.denominator)
    }
}

impl TryFrom<[u32; 2]> for PlaceFraction {
    type Error = SettlementError;

    fn try_from([numerator, denominator]: [u32; 2]) -> Result<Self, Self::Error> {
        Self::new(numerator, denominator)
    }
}

impl From<PlaceFraction> for [u32; 2] {
    fn from(fraction: PlaceFraction) -> Self {
        [fraction.numerator, fraction.denominator]
    }
}

impl std::fmt::Display for PlaceFraction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl std::str::FromStr for PlaceFraction {
    type Err = SettlementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SettlementError::InvalidPlaceTerms {
            numerator: 0,
            denominator: 0,
        };
        let (num, den) = s.trim().split_once('/').ok_or_else(invalid)?;
        let numerator = num.trim().parse().map_err(|_| invalid())?;
        let denominator = den.trim().parse().map_err(|_| invalid())?;
        Self::new(numerator, denominator)
    }
}

/// Each-way terms for a bet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EachWayConfig {
    pub place_fraction: PlaceFraction,
    /// Places paid by the bookmaker. Informational: place eligibility
    /// comes from each selection's own outcome.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub places_paid: Option<u32>,
}

impl EachWayConfig {
    pub fn new(place_fraction: PlaceFraction) -> Self {
        Self {
            place_fraction,
            places_paid: None,
        }
    }

    pub fn with_places_paid(mut self, places: u32) -> Self {
        self.places_paid = Some(places);
        self
    }
}

// ────────────────────────────────────────────
// Request
// ────────────────────────────────────────────

/// Everything needed to settle one compound bet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementRequest {
    /// Catalog key, e.g. "yankee".
    pub bet_type_key: String,
    /// Stake on each line (each part, for each-way).
    pub stake_per_line: Decimal,
    #[serde(default)]
    pub odds_notation: OddsNotation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub each_way: Option<EachWayConfig>,
    /// Rule 4 deduction in percent, [0, 90].
    #[serde(default)]
    pub rule4_percent: Decimal,
    pub selections: Vec<Selection>,
}

impl SettlementRequest {
    /// Creates a win-only request with no Rule 4 deduction.
    pub fn new(
        bet_type_key: impl Into<String>,
        stake_per_line: Decimal,
        odds_notation: OddsNotation,
        selections: Vec<Selection>,
    ) -> Self {
        Self {
            bet_type_key: bet_type_key.into(),
            stake_per_line,
            odds_notation,
            each_way: None,
            rule4_percent: Decimal::ZERO,
            selections,
        }
    }

    pub fn with_each_way(mut self, each_way: EachWayConfig) -> Self {
        self.each_way = Some(each_way);
        self
    }

    pub fn with_rule4(mut self, percent: Decimal) -> Self {
        self.rule4_percent = percent;
        self
    }

    /// Stake carried by each line: doubled for each-way.
    ///
    /// # Errors
    /// Returns `SettlementError::ArithmeticOverflow` if doubling overflows.
    pub fn stake_for_line(&self) -> Result<Decimal, SettlementError> {
        if self.each_way.is_none() {
            return Ok(self.stake_per_line);
        }
        self.stake_per_line
            .checked_mul(Decimal::TWO)
            .ok_or(SettlementError::ArithmeticOverflow("each-way line stake"))
    }

    /// Re-expresses every selection's odds in another notation.
    ///
    /// # Errors
    /// Fails on the first selection whose literal does not parse under the
    /// current notation.
    pub fn with_notation(&self, notation: OddsNotation) -> Result<Self, SettlementError> {
        let selections = self
            .selections
            .iter()
            .map(|sel| {
                let literal = odds::convert_literal(&sel.odds_literal, self.odds_notation, notation)?;
                Ok(Selection {
                    odds_literal: literal,
                    ..sel.clone()
                })
            })
            .collect::<Result<Vec<_>, SettlementError>>()?;

        Ok(Self {
            odds_notation: notation,
            selections,
            ..self.clone()
        })
    }
}

// ────────────────────────────────────────────
// Results
// ────────────────────────────────────────────

/// One settled line of a compound bet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubBet {
    pub fold_size: usize,
    /// "Single", "Double", "Treble", "Four-fold", ...
    pub fold_name: &'static str,
    /// Names of the selections in this line, in input order.
    pub selections: Vec<String>,
    pub stake: Decimal,
    pub win_return: Decimal,
    pub place_return: Decimal,
    pub total_return: Decimal,
    pub profit: Decimal,
}

impl SubBet {
    pub fn is_winner(&self) -> bool {
        self.total_return > Decimal::ZERO
    }

    fn rounded(&self, dp: u32) -> Self {
        Self {
            stake: round_money(self.stake, dp),
            win_return: round_money(self.win_return, dp),
            place_return: round_money(self.place_return, dp),
            total_return: round_money(self.total_return, dp),
            profit: round_money(self.profit, dp),
            ..self.clone()
        }
    }
}

/// Aggregated outcome of a settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementResult {
    /// Display name of the bet type.
    pub bet_type: String,
    pub total_stake: Decimal,
    pub total_returns: Decimal,
    pub total_profit: Decimal,
    pub winning_sub_bet_count: usize,
    pub sub_bets: Vec<SubBet>,
    /// Human-readable summary; never needed to reproduce the totals.
    pub explanation: String,
}

impl SettlementResult {
    pub fn losing_sub_bet_count(&self) -> usize {
        self.sub_bets.len() - self.winning_sub_bet_count
    }

    /// Copy with every money amount rounded to `dp` places for display.
    ///
    /// Rounding is per field, so rounded sub-bets need not sum exactly to
    /// the rounded totals.
    pub fn rounded(&self, dp: u32) -> Self {
        Self {
            total_stake: round_money(self.total_stake, dp),
            total_returns: round_money(self.total_returns, dp),
            total_profit: round_money(self.total_profit, dp),
            sub_bets: self.sub_bets.iter().map(|sb| sb.rounded(dp)).collect(),
            ..self.clone()
        }
    }
}

fn round_money(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}
