//! Settlement error types.
//!
//! Errors fall into the kinds the API distinguishes: validation (fix your
//! input), conflict (recalculate), invalid transition, business rule,
//! not found, and transient store failures.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tandem_shared::AppError;
use tandem_shared::types::{ExpenseId, SettlementId, UserId};
use thiserror::Error;

use super::types::SettlementStatus;

/// Errors that can occur while calculating, confirming or updating a settlement.
#[derive(Debug, Error)]
pub enum SettlementError {
    // ========== Validation Errors ==========
    /// Expense payer is neither partner.
    #[error("Expense {expense_id} was paid by {payer_id}, who is not a partner of this couple")]
    UnknownPayer {
        /// The offending expense.
        expense_id: ExpenseId,
        /// The payer recorded on it.
        payer_id: UserId,
    },

    /// Split ratio outside `[0, 1]`.
    #[error("Expense {expense_id} has split ratio {split_ratio}, expected a value between 0 and 1")]
    SplitRatioOutOfRange {
        /// The offending expense.
        expense_id: ExpenseId,
        /// The ratio recorded on it.
        split_ratio: Decimal,
    },

    /// Amount is zero or negative.
    #[error("Expense {expense_id} has non-positive amount {amount}")]
    NonPositiveAmount {
        /// The offending expense.
        expense_id: ExpenseId,
        /// The amount recorded on it.
        amount: Decimal,
    },

    /// Amount has a fractional currency unit.
    #[error("Expense {expense_id} amount {amount} is not a whole currency unit")]
    FractionalAmount {
        /// The offending expense.
        expense_id: ExpenseId,
        /// The amount recorded on it.
        amount: Decimal,
    },

    /// Totals exceed the representable range.
    #[error("Expense totals overflow")]
    AmountOverflow,

    /// Both partner ids are the same user.
    #[error("A settlement needs two distinct partners")]
    SamePartner,

    /// Period start is after its end.
    #[error("Invalid period: {start} is after {end}")]
    InvalidPeriod {
        /// Requested start.
        start: NaiveDate,
        /// Requested end.
        end: NaiveDate,
    },

    /// No expenses were selected for confirmation.
    #[error("At least one expense must be selected")]
    EmptySelection,

    /// The same expense was selected twice.
    #[error("Expense {0} was selected more than once")]
    DuplicateExpense(ExpenseId),

    // ========== Conflict Errors ==========
    /// Expense was settled after the preview was computed.
    #[error("Expense {0} is already settled")]
    ExpenseAlreadySettled(ExpenseId),

    /// Expense no longer exists or no longer belongs to the couple.
    #[error("Expense {0} no longer exists")]
    ExpenseMissing(ExpenseId),

    /// Expense date was moved outside the period.
    #[error("Expense {expense_id} dated {date} is outside the settlement period")]
    ExpenseOutsidePeriod {
        /// The offending expense.
        expense_id: ExpenseId,
        /// Its current date.
        date: NaiveDate,
    },

    /// The conditional settle update touched fewer rows than selected.
    #[error("Concurrent settlement detected: expected {expected} expenses, updated {updated}")]
    ConcurrentSettlement {
        /// Number of selected expenses.
        expected: u64,
        /// Rows actually flipped to settled.
        updated: u64,
    },

    // ========== State Errors ==========
    /// Attempted a transition out of a terminal or otherwise invalid state.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: SettlementStatus,
        /// The attempted target status.
        to: SettlementStatus,
    },

    /// Balance is zero; no settlement record may be created.
    #[error("Nothing to settle: balances are already even")]
    NothingToSettle,

    /// Settlement not found (or belongs to another couple).
    #[error("Settlement {0} not found")]
    SettlementNotFound(SettlementId),

    // ========== Store Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl SettlementError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::UnknownPayer { .. }
            | Self::SplitRatioOutOfRange { .. }
            | Self::NonPositiveAmount { .. }
            | Self::FractionalAmount { .. }
            | Self::AmountOverflow
            | Self::SamePartner
            | Self::InvalidPeriod { .. }
            | Self::EmptySelection
            | Self::DuplicateExpense(_)
            | Self::InvalidTransition { .. } => 400,

            // 404 Not Found
            Self::SettlementNotFound(_) => 404,

            // 409 Conflict - recalculate and retry
            Self::ExpenseAlreadySettled(_)
            | Self::ExpenseMissing(_)
            | Self::ExpenseOutsidePeriod { .. }
            | Self::ConcurrentSettlement { .. } => 409,

            // 422 Unprocessable - business rule
            Self::NothingToSettle => 422,

            // 500 Internal Server Error
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownPayer { .. } => "UNKNOWN_PAYER",
            Self::SplitRatioOutOfRange { .. } => "SPLIT_RATIO_OUT_OF_RANGE",
            Self::NonPositiveAmount { .. } => "NON_POSITIVE_AMOUNT",
            Self::FractionalAmount { .. } => "FRACTIONAL_AMOUNT",
            Self::AmountOverflow => "AMOUNT_OVERFLOW",
            Self::SamePartner => "SAME_PARTNER",
            Self::InvalidPeriod { .. } => "INVALID_PERIOD",
            Self::EmptySelection => "EMPTY_SELECTION",
            Self::DuplicateExpense(_) => "DUPLICATE_EXPENSE",
            Self::ExpenseAlreadySettled(_) => "EXPENSE_ALREADY_SETTLED",
            Self::ExpenseMissing(_) => "EXPENSE_MISSING",
            Self::ExpenseOutsidePeriod { .. } => "EXPENSE_OUTSIDE_PERIOD",
            Self::ConcurrentSettlement { .. } => "CONCURRENT_SETTLEMENT",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::NothingToSettle => "NOTHING_TO_SETTLE",
            Self::SettlementNotFound(_) => "SETTLEMENT_NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns true when the caller should recalculate from scratch.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        self.status_code() == 409
    }
}

impl From<SettlementError> for AppError {
    fn from(err: SettlementError) -> Self {
        let message = err.to_string();
        match err.status_code() {
            400 => Self::Validation(message),
            404 => Self::NotFound(message),
            409 => Self::Conflict(message),
            422 => Self::BusinessRule(message),
            _ => Self::Database(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validation_errors() {
        let err = SettlementError::SplitRatioOutOfRange {
            expense_id: ExpenseId::new(),
            split_ratio: dec!(1.2),
        };
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "SPLIT_RATIO_OUT_OF_RANGE");
        assert!(!err.is_conflict());
        assert!(err.to_string().contains("1.2"));
    }

    #[test]
    fn test_conflict_errors() {
        let err = SettlementError::ExpenseAlreadySettled(ExpenseId::new());
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_code(), "EXPENSE_ALREADY_SETTLED");
        assert!(err.is_conflict());

        let err = SettlementError::ConcurrentSettlement {
            expected: 3,
            updated: 2,
        };
        assert_eq!(err.status_code(), 409);
        assert_eq!(
            err.to_string(),
            "Concurrent settlement detected: expected 3 expenses, updated 2"
        );
    }

    #[test]
    fn test_invalid_transition_error() {
        let err = SettlementError::InvalidTransition {
            from: SettlementStatus::Completed,
            to: SettlementStatus::Cancelled,
        };
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "INVALID_TRANSITION");
        assert!(!err.is_conflict());
        assert!(err.to_string().contains("completed"));
        assert!(err.to_string().contains("cancelled"));
    }

    #[test]
    fn test_nothing_to_settle_error() {
        let err = SettlementError::NothingToSettle;
        assert_eq!(err.status_code(), 422);
        assert_eq!(err.error_code(), "NOTHING_TO_SETTLE");
    }

    #[test]
    fn test_conversion_into_app_error() {
        assert!(matches!(
            AppError::from(SettlementError::EmptySelection),
            AppError::Validation(_)
        ));
        assert!(matches!(
            AppError::from(SettlementError::ExpenseMissing(ExpenseId::new())),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            AppError::from(SettlementError::SettlementNotFound(SettlementId::new())),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            AppError::from(SettlementError::NothingToSettle),
            AppError::BusinessRule(_)
        ));
        assert!(matches!(
            AppError::from(SettlementError::Database("timeout".into())),
            AppError::Database(_)
        ));
    }
}
