//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates the pure domain layer into complete settlement
//! workflows. Each use case is a self-contained operation.
//!
//! Use cases:
//! - `BetCalculator`: Settles one compound bet end to end
//! - `SettlementBatch`: Settles a JSON-lines file of bets and reports

pub mod batch;
pub mod calculator;

pub use batch::{BatchItem, BatchOutcome, BatchReport, SettlementBatch, write_report};
pub use calculator::{BetCalculator, CalculatorConfig};
