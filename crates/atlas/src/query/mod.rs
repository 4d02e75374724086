//! Query Builder Module - fluent SQL builder and the mapper-aware select

pub mod builder;
pub mod dml;
pub mod ordering;
pub mod select;
pub mod sql_generation;
pub mod types;
pub mod where_clause;

pub use builder::QueryBuilder;
pub use select::Select;
pub use types::{CacheLength, OrderDirection, QueryOperator};
