//! Shared expenses and their categories.
//!
//! Typed create/update inputs and the rules they must satisfy before they
//! reach storage.

pub mod error;
pub mod types;
pub mod validation;

pub use error::ExpenseError;
pub use types::{CategoryUpdate, DEFAULT_SPLIT_RATIO, ExpenseUpdate, NewCategory, NewExpense};
pub use validation::{
    MAX_CATEGORY_NAME_LEN, MAX_DESCRIPTION_LEN, MAX_EXPENSE_AMOUNT, ensure_deletable,
    validate_amount, validate_category_update, validate_color, validate_expense_update,
    validate_new_category, validate_new_expense, validate_split_ratio,
};
