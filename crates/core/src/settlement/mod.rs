//! Settlement between the two partners of a couple.
//!
//! This module implements the settlement engine:
//! - Expense records and settlement results
//! - The pure settlement calculator
//! - Re-validation of a selection before it is committed
//! - The settlement status lifecycle (pending → completed | cancelled)
//!
//! # Modules
//!
//! - `types` - Domain types (ExpenseRecord, SettlementResult, WhoPaysWhom, ...)
//! - `error` - Settlement error taxonomy
//! - `calculator` - Net balance and transfer computation
//! - `confirmation` - Commit-time checks for a previewed selection
//! - `status` - Status state machine

pub mod calculator;
pub mod confirmation;
pub mod error;
pub mod status;
pub mod types;

#[cfg(test)]
mod calculator_props;
#[cfg(test)]
mod status_props;

pub use calculator::SettlementCalculator;
pub use confirmation::{StoredExpense, prepare_confirmation, validate_confirmation};
pub use error::SettlementError;
pub use status::{SettlementStatusService, StatusChange};
pub use types::{
    ExpenseRecord, Partners, SettlementPeriod, SettlementResult, SettlementStatus,
    SettlementStatusUpdate, Transfer, WhoPaysWhom,
};
