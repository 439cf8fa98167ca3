//! Expense and category error types.

use rust_decimal::Decimal;
use tandem_shared::AppError;
use tandem_shared::types::{CategoryId, ExpenseId, UserId};
use thiserror::Error;

/// Errors raised while validating or storing expenses and categories.
#[derive(Debug, Error)]
pub enum ExpenseError {
    // ========== Validation Errors ==========
    /// Amount is zero or negative.
    #[error("Amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    /// Amount has a fractional currency unit.
    #[error("Amount must be a whole number of yen, got {0}")]
    FractionalAmount(Decimal),

    /// Amount does not fit the stored precision.
    #[error("Amount {0} exceeds the maximum of {max}", max = super::validation::MAX_EXPENSE_AMOUNT)]
    AmountTooLarge(Decimal),

    /// Split ratio outside `[0, 1]` or with more than four decimal places.
    #[error("Split ratio must be between 0 and 1 with at most 4 decimal places, got {0}")]
    InvalidSplitRatio(Decimal),

    /// Payer is not a partner of the couple.
    #[error("User {0} is not a partner of this couple")]
    PayerNotInCouple(UserId),

    /// Description is too long.
    #[error("Description is {len} characters, maximum is {max}")]
    DescriptionTooLong {
        /// Actual length in characters.
        len: usize,
        /// Allowed length.
        max: usize,
    },

    /// Update contained no fields.
    #[error("Update must change at least one field")]
    EmptyUpdate,

    /// Category name empty or too long.
    #[error("Category name must be 1 to {max} characters", max = super::validation::MAX_CATEGORY_NAME_LEN)]
    InvalidCategoryName,

    /// Color is not `#RRGGBB`.
    #[error("Color must look like #RRGGBB, got {0}")]
    InvalidColor(String),

    // ========== Conflict Errors ==========
    /// Expense belongs to a settlement and can no longer change.
    #[error("Expense {0} is settled and cannot be modified")]
    ExpenseSettled(ExpenseId),

    /// Category name already used by this couple.
    #[error("Category '{0}' already exists")]
    DuplicateCategory(String),

    // ========== Not Found Errors ==========
    /// Expense not found (or belongs to another couple).
    #[error("Expense {0} not found")]
    ExpenseNotFound(ExpenseId),

    /// Category not found (or belongs to another couple).
    #[error("Category {0} not found")]
    CategoryNotFound(CategoryId),

    // ========== Store Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl ExpenseError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NonPositiveAmount(_)
            | Self::FractionalAmount(_)
            | Self::AmountTooLarge(_)
            | Self::InvalidSplitRatio(_)
            | Self::PayerNotInCouple(_)
            | Self::DescriptionTooLong { .. }
            | Self::EmptyUpdate
            | Self::InvalidCategoryName
            | Self::InvalidColor(_) => 400,
            Self::ExpenseNotFound(_) | Self::CategoryNotFound(_) => 404,
            Self::ExpenseSettled(_) | Self::DuplicateCategory(_) => 409,
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NonPositiveAmount(_) => "NON_POSITIVE_AMOUNT",
            Self::FractionalAmount(_) => "FRACTIONAL_AMOUNT",
            Self::AmountTooLarge(_) => "AMOUNT_TOO_LARGE",
            Self::InvalidSplitRatio(_) => "INVALID_SPLIT_RATIO",
            Self::PayerNotInCouple(_) => "PAYER_NOT_IN_COUPLE",
            Self::DescriptionTooLong { .. } => "DESCRIPTION_TOO_LONG",
            Self::EmptyUpdate => "EMPTY_UPDATE",
            Self::InvalidCategoryName => "INVALID_CATEGORY_NAME",
            Self::InvalidColor(_) => "INVALID_COLOR",
            Self::ExpenseSettled(_) => "EXPENSE_SETTLED",
            Self::DuplicateCategory(_) => "DUPLICATE_CATEGORY",
            Self::ExpenseNotFound(_) => "EXPENSE_NOT_FOUND",
            Self::CategoryNotFound(_) => "CATEGORY_NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl From<ExpenseError> for AppError {
    fn from(err: ExpenseError) -> Self {
        let message = err.to_string();
        match err.status_code() {
            400 => Self::Validation(message),
            404 => Self::NotFound(message),
            409 => Self::Conflict(message),
            _ => Self::Database(message),
        }
    }
}
