//! Query Builder DML operations (INSERT, UPDATE, DELETE)

use super::builder::QueryBuilder;
use super::types::*;
use crate::value::{DatabaseValue, FieldMap};

impl QueryBuilder {
    /// Start an INSERT query
    pub fn insert_into(mut self, table: &str) -> Self {
        self.query_type = QueryType::Insert;
        self.target_table = Some(table.to_string());
        self
    }

    /// Start an UPDATE query
    pub fn update(mut self, table: &str) -> Self {
        self.query_type = QueryType::Update;
        self.target_table = Some(table.to_string());
        self
    }

    /// Start a DELETE query
    pub fn delete_from(mut self, table: &str) -> Self {
        self.query_type = QueryType::Delete;
        self.target_table = Some(table.to_string());
        self
    }

    /// Set a column value (for INSERT/UPDATE)
    pub fn set<T: Into<DatabaseValue>>(mut self, column: &str, value: T) -> Self {
        self.set_clauses.push(SetClause {
            column: column.to_string(),
            value: value.into(),
        });
        self
    }

    /// Set every column of a field map, in order
    pub fn set_values(mut self, values: &FieldMap) -> Self {
        for (column, value) in values {
            self.set_clauses.push(SetClause {
                column: column.clone(),
                value: value.clone(),
            });
        }
        self
    }

    /// Ask the database to return the inserted row (INSERT ... RETURNING *)
    pub fn returning_all(mut self) -> Self {
        self.returning_all = true;
        self
    }
}
