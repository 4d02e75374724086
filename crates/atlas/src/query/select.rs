//! Mapper-aware SELECT queries
//!
//! `Select` wraps a [`QueryBuilder`] and carries the mapper that executes it
//! plus how long its rows may be cached. Mappers hand out pre-scoped selects
//! from `Mapper::start_query`.

use std::fmt;
use std::sync::Arc;

use super::builder::QueryBuilder;
use super::types::{CacheLength, QueryOperator};
use crate::connection::SqlDialect;
use crate::error::{OrmError, OrmResult};
use crate::mapper::Mapper;
use crate::model::Entity;
use crate::results::Results;
use crate::value::{DatabaseValue, FromValue};

const AGGREGATE_ALIAS: &str = "aggr";

/// A SELECT bound to the mapper that will run it
pub struct Select<M: Entity> {
    builder: QueryBuilder,
    mapper: Option<Arc<dyn Mapper<M>>>,
    cache_length: CacheLength,
}

impl<M: Entity> Clone for Select<M> {
    fn clone(&self) -> Self {
        Self {
            builder: self.builder.clone(),
            mapper: self.mapper.clone(),
            cache_length: self.cache_length,
        }
    }
}

impl<M: Entity> fmt::Debug for Select<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Select")
            .field("sql", &self.sql())
            .field("has_mapper", &self.mapper.is_some())
            .field("cache_length", &self.cache_length)
            .finish()
    }
}

impl<M: Entity> Default for Select<M> {
    fn default() -> Self {
        Self::new(SqlDialect::Ansi)
    }
}

impl<M: Entity> Select<M> {
    /// Unbound select for `dialect`; attach a mapper before fetching
    pub fn new(dialect: SqlDialect) -> Self {
        Self {
            builder: QueryBuilder::with_dialect(dialect),
            mapper: None,
            cache_length: CacheLength::Never,
        }
    }

    pub fn with_mapper(mut self, mapper: Arc<dyn Mapper<M>>) -> Self {
        self.mapper = Some(mapper);
        self
    }

    pub fn set_mapper(&mut self, mapper: Arc<dyn Mapper<M>>) -> &mut Self {
        self.mapper = Some(mapper);
        self
    }

    pub fn mapper(&self) -> Option<&Arc<dyn Mapper<M>>> {
        self.mapper.as_ref()
    }

    /// Cache fetched rows for `length`
    pub fn cache_for(mut self, length: CacheLength) -> Self {
        self.cache_length = length;
        self
    }

    pub fn cache_length(&self) -> CacheLength {
        self.cache_length
    }

    pub fn builder(&self) -> &QueryBuilder {
        &self.builder
    }

    fn map_builder(mut self, f: impl FnOnce(QueryBuilder) -> QueryBuilder) -> Self {
        self.builder = f(self.builder);
        self
    }

    pub fn select(self, fields: &str) -> Self {
        self.map_builder(|b| b.select(fields))
    }

    pub fn from(self, table: &str) -> Self {
        self.map_builder(|b| b.from(table))
    }

    pub fn where_eq<T: Into<DatabaseValue>>(self, column: &str, value: T) -> Self {
        self.map_builder(|b| b.where_eq(column, value))
    }

    pub fn where_condition<T: Into<DatabaseValue>>(self, column: &str, operator: QueryOperator, value: T) -> Self {
        self.map_builder(|b| b.where_condition(column, operator, value))
    }

    pub fn where_in<T: Into<DatabaseValue>>(self, column: &str, values: Vec<T>) -> Self {
        self.map_builder(|b| b.where_in(column, values))
    }

    pub fn where_like(self, column: &str, pattern: &str) -> Self {
        self.map_builder(|b| b.where_like(column, pattern))
    }

    pub fn where_null(self, column: &str) -> Self {
        self.map_builder(|b| b.where_null(column))
    }

    pub fn where_not_null(self, column: &str) -> Self {
        self.map_builder(|b| b.where_not_null(column))
    }

    pub fn order_by(self, column: &str) -> Self {
        self.map_builder(|b| b.order_by(column))
    }

    pub fn order_by_desc(self, column: &str) -> Self {
        self.map_builder(|b| b.order_by_desc(column))
    }

    pub fn limit(self, count: i64) -> Self {
        self.map_builder(|b| b.limit(count))
    }

    pub fn offset(self, count: i64) -> Self {
        self.map_builder(|b| b.offset(count))
    }

    pub fn sql(&self) -> String {
        self.builder.to_sql()
    }

    pub fn params(&self) -> Vec<DatabaseValue> {
        self.builder.params()
    }

    fn bound_mapper(&self) -> OrmResult<&Arc<dyn Mapper<M>>> {
        self.mapper.as_ref().ok_or(OrmError::UnboundQuery)
    }

    /// Run the query through its mapper
    pub fn fetch_all(&self) -> OrmResult<Results<M>> {
        self.bound_mapper()?.fetch_query(self)
    }

    /// First model of the result set, if any
    pub fn fetch(&self) -> OrmResult<Option<M>> {
        self.bound_mapper()?.fetch_query(self)?.into_first()
    }

    /// Number of rows the query matches, ignoring ordering and paging
    pub fn count(&self) -> OrmResult<i64> {
        let mapper = self.bound_mapper()?;
        let rows = mapper.fetch_query_raw(&self.counting())?;
        match rows.first().and_then(|row| row.get(AGGREGATE_ALIAS)) {
            Some(value) => i64::from_value(value),
            None => Ok(0),
        }
    }

    fn counting(&self) -> Self {
        let mut counting = self.clone();
        counting.builder.select_fields.clear();
        counting.builder.order_by.clear();
        counting.builder.limit_count = None;
        counting.builder.offset_value = None;
        counting.builder.distinct = false;
        counting.builder = counting.builder.select_count("*", Some(AGGREGATE_ALIAS));
        counting
    }
}
