//! Core business logic for Tandem.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `settlement` - Settlement calculation, confirmation checks and status lifecycle
//! - `expense` - Expense and category input rules

pub mod expense;
pub mod settlement;
