//! Connection Management
//!
//! This module provides the driver abstraction, the sqlx-backed driver, SQL
//! dialects, the caching/logging connection wrapper and the named registry.

pub mod core;
pub mod dialect;
pub mod driver;
pub mod manager;
pub mod sqlx_driver;

// Re-export for convenience
pub use self::core::Connection;
pub use dialect::SqlDialect;
pub use driver::{Driver, ExecuteResult};
pub use manager::ConnectionManager;
pub use sqlx_driver::SqlxDriver;
