//! Query Builder - Core builder implementation

use super::types::*;
use crate::connection::SqlDialect;

/// Query builder for constructing parameterised SQL statements
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    pub(crate) query_type: QueryType,
    pub(crate) dialect: SqlDialect,
    pub(crate) select_fields: Vec<String>,
    pub(crate) from_tables: Vec<String>,
    pub(crate) target_table: Option<String>,
    pub(crate) set_clauses: Vec<SetClause>,
    pub(crate) where_conditions: Vec<WhereCondition>,
    pub(crate) order_by: Vec<(String, OrderDirection)>,
    pub(crate) limit_count: Option<i64>,
    pub(crate) offset_value: Option<i64>,
    pub(crate) distinct: bool,
    pub(crate) returning_all: bool,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryBuilder {
    /// Create a new query builder using ANSI placeholders
    pub fn new() -> Self {
        Self::with_dialect(SqlDialect::Ansi)
    }

    /// Create a new query builder for a specific dialect
    pub fn with_dialect(dialect: SqlDialect) -> Self {
        Self {
            query_type: QueryType::Select,
            dialect,
            select_fields: Vec::new(),
            from_tables: Vec::new(),
            target_table: None,
            set_clauses: Vec::new(),
            where_conditions: Vec::new(),
            order_by: Vec::new(),
            limit_count: None,
            offset_value: None,
            distinct: false,
            returning_all: false,
        }
    }

    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    /// Add SELECT fields to the query
    pub fn select(mut self, fields: &str) -> Self {
        if fields == "*" {
            self.select_fields.push("*".to_string());
        } else {
            self.select_fields
                .extend(fields.split(',').map(|f| f.trim().to_string()).filter(|f| !f.is_empty()));
        }
        self
    }

    /// Replace the SELECT list entirely
    pub fn select_only(mut self, fields: &str) -> Self {
        self.select_fields.clear();
        self.select(fields)
    }

    /// Add SELECT DISTINCT to the query
    pub fn select_distinct(mut self, fields: &str) -> Self {
        self.distinct = true;
        self.select(fields)
    }

    /// Add COUNT aggregate
    pub fn select_count(mut self, column: &str, alias: Option<&str>) -> Self {
        let select_expr = match alias {
            Some(alias) => format!("COUNT({}) AS {}", column, alias),
            None => format!("COUNT({})", column),
        };
        self.select_fields.push(select_expr);
        self
    }

    /// Set the FROM table
    pub fn from(mut self, table: &str) -> Self {
        self.from_tables = vec![table.to_string()];
        self
    }
}
