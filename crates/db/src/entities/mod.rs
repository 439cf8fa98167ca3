//! `SeaORM` entity definitions.

pub mod prelude;

pub mod categories;
pub mod couples;
pub mod expenses;
pub mod sea_orm_active_enums;
pub mod settlement_expenses;
pub mod settlements;
pub mod users;
