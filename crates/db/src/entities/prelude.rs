//! Entity re-exports.

pub use super::categories::Entity as Categories;
pub use super::couples::Entity as Couples;
pub use super::expenses::Entity as Expenses;
pub use super::settlement_expenses::Entity as SettlementExpenses;
pub use super::settlements::Entity as Settlements;
pub use super::users::Entity as Users;
