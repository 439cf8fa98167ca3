//! Common types used across the application.

pub mod id;
pub mod money;
pub mod pagination;


pub use id::*;
pub use money::{YEN_DECIMAL_PLACES, is_whole_unit, round_to_unit};
pub use pagination::{PageMeta, PageRequest, PageResponse};
