//! Commit-time checks for a previewed settlement.
//!
//! A preview is computed from whatever was unsettled at the time. Between the
//! preview and the confirmation the other partner may have edited, deleted or
//! settled some of those expenses, so the selection is checked again against
//! the freshly locked rows before anything is written.

use std::collections::HashSet;

use tandem_shared::types::{CoupleId, ExpenseId, UserId};

use super::calculator::SettlementCalculator;
use super::error::SettlementError;
use super::types::{ExpenseRecord, SettlementPeriod, SettlementResult};

/// An expense row as currently stored, with its owning couple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredExpense {
    /// Couple that owns the expense.
    pub couple_id: CoupleId,
    /// The expense itself.
    pub record: ExpenseRecord,
}

/// Check a confirmation request against the current state of storage.
///
/// Returns the records to settle, in the order they were requested. The
/// whole request is rejected on the first problem; nothing is settled
/// partially.
///
/// # Errors
///
/// - `EmptySelection` / `DuplicateExpense` for a malformed request
/// - `ExpenseMissing` if an id is unknown or belongs to another couple
/// - `ExpenseAlreadySettled` if an expense was settled since the preview
/// - `ExpenseOutsidePeriod` if an expense date was moved out of the period
pub fn validate_confirmation(
    couple_id: CoupleId,
    period: &SettlementPeriod,
    requested: &[ExpenseId],
    current: &[StoredExpense],
) -> Result<Vec<ExpenseRecord>, SettlementError> {
    if requested.is_empty() {
        return Err(SettlementError::EmptySelection);
    }

    let mut seen = HashSet::with_capacity(requested.len());
    for id in requested {
        if !seen.insert(*id) {
            return Err(SettlementError::DuplicateExpense(*id));
        }
    }

    requested
        .iter()
        .map(|id| {
            let stored = current
                .iter()
                .find(|s| s.record.id == *id && s.couple_id == couple_id)
                .ok_or(SettlementError::ExpenseMissing(*id))?;

            if stored.record.settled {
                return Err(SettlementError::ExpenseAlreadySettled(*id));
            }

            if !period.contains(stored.record.date) {
                return Err(SettlementError::ExpenseOutsidePeriod {
                    expense_id: *id,
                    date: stored.record.date,
                });
            }

            Ok(stored.record.clone())
        })
        .collect()
}

/// Validate a confirmation and compute the settlement it would create.
///
/// # Errors
///
/// Everything `validate_confirmation` and `SettlementCalculator::calculate`
/// return, plus `NothingToSettle` when the selection nets out to zero.
pub fn prepare_confirmation(
    couple_id: CoupleId,
    user1_id: UserId,
    user2_id: UserId,
    period: SettlementPeriod,
    requested: &[ExpenseId],
    current: &[StoredExpense],
) -> Result<SettlementResult, SettlementError> {
    let records = validate_confirmation(couple_id, &period, requested, current)?;
    let result = SettlementCalculator::calculate(&records, user1_id, user2_id, period)?;

    if !result.requires_settlement() {
        return Err(SettlementError::NothingToSettle);
    }

    Ok(result)
}
