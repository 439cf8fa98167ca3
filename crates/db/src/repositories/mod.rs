//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod category;
pub mod couple;
pub mod expense;
pub mod settlement;
pub mod user;

pub use category::CategoryRepository;
pub use couple::{Couple, CoupleRepository};
pub use expense::{ExpenseFilter, ExpenseRepository};
pub use settlement::{SettlementPreview, SettlementRepository, SettlementWithExpenses};
pub use user::UserRepository;
