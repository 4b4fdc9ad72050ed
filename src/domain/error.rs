//! Settlement error kinds.
//!
//! Every failure the engine can produce is a distinct variant so callers
//! can present it without string matching. Nothing here is ever swallowed:
//! a calculation either returns a full result or exactly one of these.

use rust_decimal::Decimal;

/// Errors raised while converting odds or settling a bet.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettlementError {
    #[error("Malformed odds literal '{literal}': {reason}")]
    OddsParse { literal: String, reason: String },

    #[error("{bet_type} requires {expected} selections, got {actual}")]
    SelectionCountMismatch {
        bet_type: String,
        expected: usize,
        actual: usize,
    },

    #[error("Stake per line must be positive, got {0}")]
    InvalidStake(Decimal),

    #[error("Unknown bet type: {0}")]
    UnknownBetType(String),

    #[error("Rule 4 deduction must be within [0, 90]%, got {0}")]
    InvalidRule4(Decimal),

    #[error("Invalid each-way place terms {numerator}/{denominator}")]
    InvalidPlaceTerms { numerator: u32, denominator: u32 },

    /// A price, stake or return left the range `Decimal` can represent.
    #[error("Arithmetic overflow computing {0}")]
    ArithmeticOverflow(&'static str),

    /// Generated sub-bets disagree with the catalog. A defect, not user input.
    #[error("Internal consistency failure for {bet_type}: expected {expected} sub-bets, generated {actual}")]
    InternalConsistency {
        bet_type: String,
        expected: usize,
        actual: usize,
    },
}

impl SettlementError {
    pub(crate) fn odds(literal: &str, reason: impl Into<String>) -> Self {
        Self::OddsParse {
            literal: literal.to_string(),
            reason: reason.into(),
        }
    }

    /// True when the error stems from caller input rather than an engine defect.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, Self::InternalConsistency { .. })
    }
}
