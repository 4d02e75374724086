//! Model System - the contracts plain model types implement
//!
//! - `core_trait`: the `Entity` trait and the loaded-state rule
//! - `capabilities`: optional identity and timestamp capabilities
//! - `timestamps`: embeddable timestamp pair and date-time coercion
//! - `crud_operations`: save/delete/query through a model's own mapper

pub mod capabilities;
pub mod core_trait;
pub mod crud_operations;
pub mod timestamps;

pub use capabilities::{HasIdentity, HasTimestamps};
pub use core_trait::{is_loaded, Entity};
pub use crud_operations::Crud;
pub use timestamps::{datetime_from_value, Timestamps};
