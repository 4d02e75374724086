//! Query Builder WHERE clause operations

use super::builder::QueryBuilder;
use super::types::*;
use crate::value::{DatabaseValue, FieldMap};

impl QueryBuilder {
    fn push_condition(mut self, column: &str, operator: QueryOperator, value: Option<DatabaseValue>, values: Vec<DatabaseValue>) -> Self {
        self.where_conditions.push(WhereCondition {
            column: column.to_string(),
            operator,
            value,
            values,
        });
        self
    }

    /// Add WHERE condition with equality; a null value becomes IS NULL
    pub fn where_eq<T: Into<DatabaseValue>>(self, column: &str, value: T) -> Self {
        match value.into() {
            DatabaseValue::Null => self.where_null(column),
            value => self.push_condition(column, QueryOperator::Equal, Some(value), Vec::new()),
        }
    }

    /// Add WHERE condition with not equal
    pub fn where_ne<T: Into<DatabaseValue>>(self, column: &str, value: T) -> Self {
        self.push_condition(column, QueryOperator::NotEqual, Some(value.into()), Vec::new())
    }

    /// Add WHERE condition with an explicit operator
    pub fn where_condition<T: Into<DatabaseValue>>(self, column: &str, operator: QueryOperator, value: T) -> Self {
        match operator {
            QueryOperator::IsNull => self.where_null(column),
            QueryOperator::IsNotNull => self.where_not_null(column),
            QueryOperator::In | QueryOperator::NotIn => {
                let values = match value.into() {
                    DatabaseValue::Array(items) => items,
                    single => vec![single],
                };
                self.push_condition(column, operator, None, values)
            }
            _ => self.push_condition(column, operator, Some(value.into()), Vec::new()),
        }
    }

    /// Add WHERE condition with IN
    pub fn where_in<T: Into<DatabaseValue>>(self, column: &str, values: Vec<T>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.push_condition(column, QueryOperator::In, None, values)
    }

    /// Add WHERE condition with NOT IN
    pub fn where_not_in<T: Into<DatabaseValue>>(self, column: &str, values: Vec<T>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.push_condition(column, QueryOperator::NotIn, None, values)
    }

    /// Add WHERE condition with LIKE
    pub fn where_like(self, column: &str, pattern: &str) -> Self {
        self.push_condition(column, QueryOperator::Like, Some(pattern.into()), Vec::new())
    }

    /// Add WHERE condition with IS NULL
    pub fn where_null(self, column: &str) -> Self {
        self.push_condition(column, QueryOperator::IsNull, None, Vec::new())
    }

    /// Add WHERE condition with IS NOT NULL
    pub fn where_not_null(self, column: &str) -> Self {
        self.push_condition(column, QueryOperator::IsNotNull, None, Vec::new())
    }

    /// AND together an equality condition for every entry of `conditions`
    pub fn where_fields(self, conditions: &FieldMap) -> Self {
        conditions
            .iter()
            .fold(self, |query, (column, value)| query.where_eq(column, value.clone()))
    }
}
