//! Domain layer - Core bet settlement logic and models.
//!
//! Pure functions and value types only: no I/O, no logging, no shared
//! state. Every calculation takes a full request and either returns a
//! result or a typed `SettlementError`.

pub mod bet;
pub mod bet_type;
pub mod combinations;
pub mod error;
pub mod odds;
pub mod settlement;

// Re-export core types for convenience
pub use bet::{
    EachWayConfig, Outcome, PlaceFraction, Selection, SettlementRequest, SettlementResult, SubBet,
};
pub use bet_type::{BetTypeDefinition, CATALOG, all_keys, definition_for, fold_name};
pub use combinations::{binomial, combinations};
pub use error::SettlementError;
pub use odds::OddsNotation;
pub use settlement::{FoldReturn, PricedLeg, SettlementEvaluator};
