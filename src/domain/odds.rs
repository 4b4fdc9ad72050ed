//! Racing odds conversion.
//!
//! Normalizes between the two conventional notations:
//! - Fractional "a/b": net profit per unit staked (5/2 pays 2.5 + stake)
//! - Decimal: payout multiplier including the stake (5/2 == 3.50)
//!
//! Everything is computed in `Decimal` so that 1/3 style prices and
//! long accumulator products never pick up binary float drift.
//! Malformed literals are rejected; there is no fallback price.

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::RoundingStrategy;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::error::SettlementError;

/// Largest denominator `from_decimal` will emit for fractional odds.
pub const MAX_FRACTIONAL_DENOMINATOR: u64 = 20;

/// Worst-case drift of `to_decimal(from_decimal(d, Fractional))` from `d`.
///
/// Equals 1 / (2 * `MAX_FRACTIONAL_DENOMINATOR`).
pub const FRACTIONAL_TOLERANCE: Decimal = dec!(0.025);

/// Worst-case drift of `to_decimal(from_decimal(d, Decimal))` from `d`.
pub const DECIMAL_TOLERANCE: Decimal = dec!(0.005);

/// Odds notation shared by every selection in one calculation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OddsNotation {
    /// "a/b" style, e.g. 11/4.
    #[default]
    Fractional,
    /// Payout multiplier, e.g. 3.75.
    Decimal,
}

impl std::fmt::Display for OddsNotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fractional => write!(f, "fractional"),
            Self::Decimal => write!(f, "decimal"),
        }
    }
}

impl FromStr for OddsNotation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fractional" | "frac" => Ok(Self::Fractional),
            "decimal" | "dec" => Ok(Self::Decimal),
            other => Err(format!("unknown odds notation '{other}'")),
        }
    }
}

/// Parses an odds literal into its decimal payout multiplier (>= 1.0).
///
/// # Errors
/// Returns `SettlementError::OddsParse` for empty, non-numeric, negative,
/// zero-denominator, or sub-1.0 decimal inputs.
pub fn to_decimal(literal: &str, notation: OddsNotation) -> Result<Decimal, SettlementError> {
    let trimmed = literal.trim();
    if trimmed.is_empty() {
        return Err(SettlementError::odds(literal, "empty literal"));
    }

    match notation {
        OddsNotation::Decimal => {
            let value = parse_number(literal, trimmed)?;
            if value < Decimal::ONE {
                return Err(SettlementError::odds(
                    literal,
                    "decimal odds must be at least 1.0",
                ));
            }
            Ok(value)
        }
        OddsNotation::Fractional => {
            let (num, den) = trimmed
                .split_once('/')
                .ok_or_else(|| SettlementError::odds(literal, "expected the form a/b"))?;
            let numerator = parse_number(literal, num)?;
            let denominator = parse_number(literal, den)?;

            if denominator.is_zero() {
                return Err(SettlementError::odds(literal, "zero denominator"));
            }
            if numerator.is_sign_negative() || denominator.is_sign_negative() {
                return Err(SettlementError::odds(literal, "negative odds component"));
            }

            numerator
                .checked_div(denominator)
                .and_then(|ratio| ratio.checked_add(Decimal::ONE))
                .ok_or_else(|| SettlementError::odds(literal, "odds out of range"))
        }
    }
}

/// Renders decimal odds back into a literal of the requested notation.
///
/// Fractional output is quantized to the nearest fraction with a
/// denominator of at most `MAX_FRACTIONAL_DENOMINATOR`, reduced to lowest
/// terms. The conversion is lossy for arbitrary inputs; see
/// `FRACTIONAL_TOLERANCE` and `DECIMAL_TOLERANCE`.
///
/// # Errors
/// Returns `SettlementError::OddsParse` if `decimal` is below 1.0 or too
/// large to quantize.
pub fn from_decimal(decimal: Decimal, notation: OddsNotation) -> Result<String, SettlementError> {
    if decimal < Decimal::ONE {
        return Err(SettlementError::odds(
            &decimal.to_string(),
            "decimal odds must be at least 1.0",
        ));
    }

    match notation {
        OddsNotation::Decimal => {
            let rounded = decimal.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            Ok(format!("{rounded:.2}"))
        }
        OddsNotation::Fractional => {
            let (numerator, denominator) = nearest_fraction(decimal)?;
            Ok(format!("{numerator}/{denominator}"))
        }
    }
}

/// Re-expresses a literal in another notation.
///
/// # Errors
/// Propagates parse failures of `literal` under `from`.
pub fn convert_literal(
    literal: &str,
    from: OddsNotation,
    to: OddsNotation,
) -> Result<String, SettlementError> {
    from_decimal(to_decimal(literal, from)?, to)
}

/// Applies a Rule 4 deduction to decimal odds.
///
/// adjusted = d - (d - 1) * percent / 100, so only the profit part shrinks.
///
/// # Errors
/// Returns `SettlementError::ArithmeticOverflow` if the price is out of range.
pub fn rule4_adjusted(decimal: Decimal, percent: Decimal) -> Result<Decimal, SettlementError> {
    let overflow = || SettlementError::ArithmeticOverflow("Rule 4 adjusted odds");
    let deduction = decimal
        .checked_sub(Decimal::ONE)
        .and_then(|profit| profit.checked_mul(percent / Decimal::ONE_HUNDRED))
        .ok_or_else(overflow)?;
    decimal.checked_sub(deduction).ok_or_else(overflow)
}

/// Place-part multiplier for each-way terms: 1 + (adjusted - 1) * fraction.
///
/// # Errors
/// Returns `SettlementError::ArithmeticOverflow` if the price is out of range.
pub fn place_odds(adjusted: Decimal, place_fraction: Decimal) -> Result<Decimal, SettlementError> {
    adjusted
        .checked_sub(Decimal::ONE)
        .and_then(|profit| profit.checked_mul(place_fraction))
        .and_then(|profit| profit.checked_add(Decimal::ONE))
        .ok_or(SettlementError::ArithmeticOverflow("place odds"))
}

/// Accumulator price of several legs: the product of their decimal odds.
///
/// # Errors
/// Returns `SettlementError::ArithmeticOverflow` if the product is out of range.
pub fn combined_price(
    prices: impl IntoIterator<Item = Decimal>,
) -> Result<Decimal, SettlementError> {
    prices
        .into_iter()
        .try_fold(Decimal::ONE, Decimal::checked_mul)
        .ok_or(SettlementError::ArithmeticOverflow("combined price"))
}

/// Closing line value in percent: how much better the taken price was
/// than the closing (starting) price.
///
/// CLV = (taken - closing) / closing * 100, rounded to 2 dp.
/// Returns `None` when the closing price is not a valid decimal price or
/// the value is out of range.
pub fn closing_line_value(taken: Decimal, closing: Decimal) -> Option<Decimal> {
    if closing < Decimal::ONE {
        return None;
    }
    let clv = taken
        .checked_sub(closing)?
        .checked_div(closing)?
        .checked_mul(Decimal::ONE_HUNDRED)?;
    Some(clv.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

fn parse_number(literal: &str, part: &str) -> Result<Decimal, SettlementError> {
    part.trim()
        .parse::<Decimal>()
        .map_err(|_| SettlementError::odds(literal, format!("'{}' is not a number", part.trim())))
}

/// Best fraction for `decimal - 1`, smallest denominator winning ties.
fn nearest_fraction(decimal: Decimal) -> Result<(u64, u64), SettlementError> {
    let profit = decimal - Decimal::ONE;
    let out_of_range = || SettlementError::odds(&decimal.to_string(), "odds too large to express as a fraction");

    let mut best: Option<(Decimal, u64, u64)> = None;
    for denominator in 1..=MAX_FRACTIONAL_DENOMINATOR {
        let den = Decimal::from(denominator);
        let numerator = profit
            .checked_mul(den)
            .ok_or_else(out_of_range)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        let error = (numerator / den - profit).abs();

        if best.is_none_or(|(best_error, _, _)| error < best_error) {
            let numerator = numerator.to_u64().ok_or_else(out_of_range)?;
            best = Some((error, numerator, denominator));
        }
    }

    let (_, numerator, denominator) = best.ok_or_else(out_of_range)?;
    let divisor = gcd(numerator, denominator);
    Ok((numerator / divisor, denominator / divisor))
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a.max(1)
}
