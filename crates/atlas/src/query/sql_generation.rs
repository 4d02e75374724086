//! Query Builder SQL generation
//!
//! SELECT text keeps identifiers as written so callers can use qualified or
//! aliased expressions. INSERT/UPDATE/DELETE quote table and column names for
//! the builder's dialect. Every value becomes a bound parameter.

use super::builder::QueryBuilder;
use super::types::*;
use crate::value::DatabaseValue;

impl QueryBuilder {
    /// Generate SQL with dialect placeholders and the ordered parameter list
    pub fn to_sql_with_params(&self) -> (String, Vec<DatabaseValue>) {
        let mut params = Vec::new();
        let sql = match self.query_type {
            QueryType::Select => self.build_select_sql(&mut params),
            QueryType::Insert => self.build_insert_sql(&mut params),
            QueryType::Update => self.build_update_sql(&mut params),
            QueryType::Delete => self.build_delete_sql(&mut params),
        };
        (sql, params)
    }

    /// SQL text only
    pub fn to_sql(&self) -> String {
        self.to_sql_with_params().0
    }

    /// Parameters only, in placeholder order
    pub fn params(&self) -> Vec<DatabaseValue> {
        self.to_sql_with_params().1
    }

    fn build_select_sql(&self, params: &mut Vec<DatabaseValue>) -> String {
        let mut sql = String::new();

        if self.distinct {
            sql.push_str("SELECT DISTINCT ");
        } else {
            sql.push_str("SELECT ");
        }

        if self.select_fields.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.select_fields.join(", "));
        }

        if !self.from_tables.is_empty() {
            sql.push_str(" FROM ");
            sql.push_str(&self.from_tables.join(", "));
        }

        self.build_where_clause(&mut sql, params, false);
        self.build_order_limit_clause(&mut sql);
        sql
    }

    fn build_insert_sql(&self, params: &mut Vec<DatabaseValue>) -> String {
        let Some(table) = &self.target_table else {
            return String::new();
        };
        let mut sql = format!("INSERT INTO {}", self.dialect.quote_identifier(table));

        if self.set_clauses.is_empty() {
            sql.push_str(" DEFAULT VALUES");
        } else {
            let columns: Vec<String> = self
                .set_clauses
                .iter()
                .map(|clause| self.dialect.quote_identifier(&clause.column))
                .collect();
            let placeholders: Vec<String> = self
                .set_clauses
                .iter()
                .map(|clause| self.push_param(params, clause.value.clone()))
                .collect();
            sql.push_str(&format!(" ({}) VALUES ({})", columns.join(", "), placeholders.join(", ")));
        }

        if self.returning_all {
            sql.push_str(" RETURNING *");
        }
        sql
    }

    fn build_update_sql(&self, params: &mut Vec<DatabaseValue>) -> String {
        let Some(table) = &self.target_table else {
            return String::new();
        };
        let mut sql = format!("UPDATE {}", self.dialect.quote_identifier(table));

        if !self.set_clauses.is_empty() {
            let assignments: Vec<String> = self
                .set_clauses
                .iter()
                .map(|clause| {
                    format!(
                        "{} = {}",
                        self.dialect.quote_identifier(&clause.column),
                        self.push_param(params, clause.value.clone())
                    )
                })
                .collect();
            sql.push_str(" SET ");
            sql.push_str(&assignments.join(", "));
        }

        self.build_where_clause(&mut sql, params, true);
        sql
    }

    fn build_delete_sql(&self, params: &mut Vec<DatabaseValue>) -> String {
        let Some(table) = &self.target_table else {
            return String::new();
        };
        let mut sql = format!("DELETE FROM {}", self.dialect.quote_identifier(table));
        self.build_where_clause(&mut sql, params, true);
        sql
    }

    fn push_param(&self, params: &mut Vec<DatabaseValue>, value: DatabaseValue) -> String {
        let placeholder = self.dialect.parameter_placeholder(params.len());
        params.push(value);
        placeholder
    }

    /// Helper method to build WHERE clauses
    fn build_where_clause(&self, sql: &mut String, params: &mut Vec<DatabaseValue>, quote: bool) {
        if self.where_conditions.is_empty() {
            return;
        }

        let conditions: Vec<String> = self
            .where_conditions
            .iter()
            .map(|condition| {
                let column = if quote {
                    self.dialect.quote_identifier(&condition.column)
                } else {
                    condition.column.clone()
                };

                match condition.operator {
                    QueryOperator::IsNull | QueryOperator::IsNotNull => {
                        format!("{} {}", column, condition.operator)
                    }
                    QueryOperator::In | QueryOperator::NotIn => {
                        if condition.values.is_empty() {
                            // nothing is IN an empty list, everything is NOT IN it
                            return if condition.operator == QueryOperator::In {
                                "1 = 0".to_string()
                            } else {
                                "1 = 1".to_string()
                            };
                        }
                        let placeholders: Vec<String> = condition
                            .values
                            .iter()
                            .map(|value| self.push_param(params, value.clone()))
                            .collect();
                        format!("{} {} ({})", column, condition.operator, placeholders.join(", "))
                    }
                    _ => {
                        let value = condition.value.clone().unwrap_or(DatabaseValue::Null);
                        format!("{} {} {}", column, condition.operator, self.push_param(params, value))
                    }
                }
            })
            .collect();

        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }

    /// Helper method to build ORDER BY and LIMIT clauses
    fn build_order_limit_clause(&self, sql: &mut String) {
        if !self.order_by.is_empty() {
            let order_clauses: Vec<String> = self
                .order_by
                .iter()
                .map(|(column, direction)| format!("{} {}", column, direction))
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&order_clauses.join(", "));
        }

        if let Some(limit) = self.limit_count {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        if let Some(offset) = self.offset_value {
            sql.push_str(&format!(" OFFSET {}", offset));
        }
    }
}
