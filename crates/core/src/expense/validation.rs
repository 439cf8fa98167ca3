//! Expense and category validation.
//!
//! Amount and ratio rules match the settlement calculator's preconditions so
//! a stored expense can always be settled.

use rust_decimal::Decimal;
use tandem_shared::types::{ExpenseId, is_whole_unit};

use super::error::ExpenseError;
use super::types::{CategoryUpdate, ExpenseUpdate, NewCategory, NewExpense};
use crate::settlement::Partners;

/// Largest amount that fits `NUMERIC(14, 0)`.
pub const MAX_EXPENSE_AMOUNT: i64 = 99_999_999_999_999;

/// Maximum description length in characters.
pub const MAX_DESCRIPTION_LEN: usize = 200;

/// Maximum category name length in characters.
pub const MAX_CATEGORY_NAME_LEN: usize = 50;

/// Split ratios are stored as `NUMERIC(5, 4)`.
const SPLIT_RATIO_SCALE: u32 = 4;

/// Validate an expense amount.
pub fn validate_amount(amount: Decimal) -> Result<(), ExpenseError> {
    if amount <= Decimal::ZERO {
        return Err(ExpenseError::NonPositiveAmount(amount));
    }
    if !is_whole_unit(amount) {
        return Err(ExpenseError::FractionalAmount(amount));
    }
    if amount > Decimal::from(MAX_EXPENSE_AMOUNT) {
        return Err(ExpenseError::AmountTooLarge(amount));
    }
    Ok(())
}

/// Validate a split ratio.
pub fn validate_split_ratio(ratio: Decimal) -> Result<(), ExpenseError> {
    let in_range = ratio >= Decimal::ZERO && ratio <= Decimal::ONE;
    if !in_range || ratio.normalize().scale() > SPLIT_RATIO_SCALE {
        return Err(ExpenseError::InvalidSplitRatio(ratio));
    }
    Ok(())
}

/// Trim and length-check a description.
pub fn validate_description(description: &str) -> Result<String, ExpenseError> {
    let trimmed = description.trim();
    let len = trimmed.chars().count();
    if len > MAX_DESCRIPTION_LEN {
        return Err(ExpenseError::DescriptionTooLong {
            len,
            max: MAX_DESCRIPTION_LEN,
        });
    }
    Ok(trimmed.to_string())
}

/// Validate a new expense for a couple, returning the normalized input.
pub fn validate_new_expense(
    input: NewExpense,
    partners: &Partners,
) -> Result<NewExpense, ExpenseError> {
    validate_amount(input.amount)?;
    validate_split_ratio(input.split_ratio)?;
    if !partners.contains(input.payer_id) {
        return Err(ExpenseError::PayerNotInCouple(input.payer_id));
    }
    let description = validate_description(&input.description)?;

    Ok(NewExpense {
        amount: input.amount.normalize(),
        split_ratio: input.split_ratio.normalize(),
        description,
        ..input
    })
}

/// Validate an update to an existing expense, returning the normalized update.
///
/// Settled expenses are immutable.
pub fn validate_expense_update(
    expense_id: ExpenseId,
    settled: bool,
    update: ExpenseUpdate,
    partners: &Partners,
) -> Result<ExpenseUpdate, ExpenseError> {
    if update.is_empty() {
        return Err(ExpenseError::EmptyUpdate);
    }
    if settled {
        return Err(ExpenseError::ExpenseSettled(expense_id));
    }

    if let Some(amount) = update.amount {
        validate_amount(amount)?;
    }
    if let Some(ratio) = update.split_ratio {
        validate_split_ratio(ratio)?;
    }
    if let Some(payer_id) = update.payer_id
        && !partners.contains(payer_id)
    {
        return Err(ExpenseError::PayerNotInCouple(payer_id));
    }
    let description = update
        .description
        .as_deref()
        .map(validate_description)
        .transpose()?;

    Ok(ExpenseUpdate {
        amount: update.amount.map(|a| a.normalize()),
        split_ratio: update.split_ratio.map(|r| r.normalize()),
        description,
        ..update
    })
}

/// Deleting is only allowed while the expense is unsettled.
pub fn ensure_deletable(expense_id: ExpenseId, settled: bool) -> Result<(), ExpenseError> {
    if settled {
        return Err(ExpenseError::ExpenseSettled(expense_id));
    }
    Ok(())
}

/// Trim and length-check a category name.
pub fn validate_category_name(name: &str) -> Result<String, ExpenseError> {
    let trimmed = name.trim();
    let len = trimmed.chars().count();
    if len == 0 || len > MAX_CATEGORY_NAME_LEN {
        return Err(ExpenseError::InvalidCategoryName);
    }
    Ok(trimmed.to_string())
}

/// Check a `#RRGGBB` color, returning it uppercased.
pub fn validate_color(color: &str) -> Result<String, ExpenseError> {
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(ExpenseError::InvalidColor(color.to_string()));
    }
    Ok(color.to_ascii_uppercase())
}

/// Validate a new category.
pub fn validate_new_category(input: NewCategory) -> Result<NewCategory, ExpenseError> {
    Ok(NewCategory {
        name: validate_category_name(&input.name)?,
        color: input.color.as_deref().map(validate_color).transpose()?,
    })
}

/// Validate a category update.
pub fn validate_category_update(update: CategoryUpdate) -> Result<CategoryUpdate, ExpenseError> {
    if update.is_empty() {
        return Err(ExpenseError::EmptyUpdate);
    }
    let name = update
        .name
        .as_deref()
        .map(validate_category_name)
        .transpose()?;
    let color = match update.color {
        Some(Some(color)) => Some(Some(validate_color(&color)?)),
        other => other,
    };
    Ok(CategoryUpdate { name, color })
}
