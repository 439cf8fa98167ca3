//! Expense and category input types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use tandem_shared::types::{CategoryId, UserId};

/// Default split ratio: an even split.
pub const DEFAULT_SPLIT_RATIO: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

fn default_split_ratio() -> Decimal {
    DEFAULT_SPLIT_RATIO
}

/// Distinguishes an absent field from an explicit `null`.
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/// Input for recording a new shared expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewExpense {
    /// Partner who paid.
    pub payer_id: UserId,
    /// Optional category.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    /// Amount in whole yen.
    pub amount: Decimal,
    /// User1's share; defaults to an even split.
    #[serde(default = "default_split_ratio")]
    pub split_ratio: Decimal,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Date the expense was incurred.
    pub expense_date: NaiveDate,
}

/// Partial update of an expense. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseUpdate {
    /// New amount.
    #[serde(default)]
    pub amount: Option<Decimal>,
    /// New split ratio.
    #[serde(default)]
    pub split_ratio: Option<Decimal>,
    /// New payer.
    #[serde(default)]
    pub payer_id: Option<UserId>,
    /// `Some(None)` clears the category.
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<CategoryId>>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// New date.
    #[serde(default)]
    pub expense_date: Option<NaiveDate>,
}

impl ExpenseUpdate {
    /// Returns true if the update changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.amount.is_none()
            && self.split_ratio.is_none()
            && self.payer_id.is_none()
            && self.category_id.is_none()
            && self.description.is_none()
            && self.expense_date.is_none()
    }
}

/// Input for creating a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    /// Display name, unique per couple.
    pub name: String,
    /// Optional `#RRGGBB` color.
    #[serde(default)]
    pub color: Option<String>,
}

/// Partial update of a category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryUpdate {
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// `Some(None)` clears the color.
    #[serde(default, deserialize_with = "double_option")]
    pub color: Option<Option<String>>,
}

impl CategoryUpdate {
    /// Returns true if the update changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.color.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_split_ratio_is_half() {
        assert_eq!(DEFAULT_SPLIT_RATIO, dec!(0.5));
    }

    #[test]
    fn test_new_expense_defaults() {
        let payer = UserId::new();
        let json = format!(
            r#"{{"payer_id":"{payer}","amount":"1200","expense_date":"2024-01-10"}}"#
        );
        let input: NewExpense = serde_json::from_str(&json).unwrap();

        assert_eq!(input.amount, dec!(1200));
        assert_eq!(input.split_ratio, dec!(0.5));
        assert!(input.description.is_empty());
        assert!(input.category_id.is_none());
    }

    #[test]
    fn test_update_distinguishes_null_from_absent() {
        let absent: ExpenseUpdate = serde_json::from_str(r#"{"amount":"500"}"#).unwrap();
        assert_eq!(absent.category_id, None);
        assert!(!absent.is_empty());

        let cleared: ExpenseUpdate = serde_json::from_str(r#"{"category_id":null}"#).unwrap();
        assert_eq!(cleared.category_id, Some(None));
        assert!(!cleared.is_empty());

        let id = CategoryId::new();
        let set: ExpenseUpdate =
            serde_json::from_str(&format!(r#"{{"category_id":"{id}"}}"#)).unwrap();
        assert_eq!(set.category_id, Some(Some(id)));
    }

    #[test]
    fn test_empty_updates() {
        let update: ExpenseUpdate = serde_json::from_str("{}").unwrap();
        assert!(update.is_empty());

        let update: CategoryUpdate = serde_json::from_str("{}").unwrap();
        assert!(update.is_empty());

        let update: CategoryUpdate = serde_json::from_str(r#"{"color":null}"#).unwrap();
        assert_eq!(update.color, Some(None));
        assert!(!update.is_empty());
    }
}
