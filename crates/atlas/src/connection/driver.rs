//! Raw statement execution

use crate::error::OrmResult;
use crate::value::{DatabaseValue, Row};

/// Outcome of a statement that returns no rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecuteResult {
    pub rows_affected: u64,
    pub last_insert_id: Option<i64>,
}

/// A blocking SQL driver.
///
/// Statements arrive with placeholders already in the connection's dialect and
/// parameters in placeholder order.
pub trait Driver: Send + Sync {
    /// Driver family, e.g. `"sqlite"` or `"postgres"`
    fn driver_name(&self) -> &str;

    fn execute(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<ExecuteResult>;

    fn fetch_all(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Vec<Row>>;
}
