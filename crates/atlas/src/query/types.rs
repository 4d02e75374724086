//! Query Builder Types - Core types and enums for query building

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::DatabaseValue;

/// Query operator types
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Like,
    NotLike,
    In,
    NotIn,
    IsNull,
    IsNotNull,
}

impl QueryOperator {
    /// Parse an operator as written in SQL, `None` when unsupported
    pub fn parse(operator: &str) -> Option<Self> {
        let op = match operator.trim().to_ascii_uppercase().as_str() {
            "=" => QueryOperator::Equal,
            "!=" | "<>" => QueryOperator::NotEqual,
            ">" => QueryOperator::GreaterThan,
            ">=" => QueryOperator::GreaterThanOrEqual,
            "<" => QueryOperator::LessThan,
            "<=" => QueryOperator::LessThanOrEqual,
            "LIKE" => QueryOperator::Like,
            "NOT LIKE" => QueryOperator::NotLike,
            "IN" => QueryOperator::In,
            "NOT IN" => QueryOperator::NotIn,
            _ => return None,
        };
        Some(op)
    }
}

impl fmt::Display for QueryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryOperator::Equal => write!(f, "="),
            QueryOperator::NotEqual => write!(f, "!="),
            QueryOperator::GreaterThan => write!(f, ">"),
            QueryOperator::GreaterThanOrEqual => write!(f, ">="),
            QueryOperator::LessThan => write!(f, "<"),
            QueryOperator::LessThanOrEqual => write!(f, "<="),
            QueryOperator::Like => write!(f, "LIKE"),
            QueryOperator::NotLike => write!(f, "NOT LIKE"),
            QueryOperator::In => write!(f, "IN"),
            QueryOperator::NotIn => write!(f, "NOT IN"),
            QueryOperator::IsNull => write!(f, "IS NULL"),
            QueryOperator::IsNotNull => write!(f, "IS NOT NULL"),
        }
    }
}

/// Where clause condition
#[derive(Debug, Clone)]
pub struct WhereCondition {
    pub column: String,
    pub operator: QueryOperator,
    pub value: Option<DatabaseValue>,
    pub values: Vec<DatabaseValue>, // For IN, NOT IN
}

/// Order by direction
#[derive(Debug, Clone, PartialEq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderDirection::Asc => write!(f, "ASC"),
            OrderDirection::Desc => write!(f, "DESC"),
        }
    }
}

/// Query types supported by the builder
#[derive(Debug, Clone, PartialEq)]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
}

/// Set clause for UPDATE and INSERT operations
#[derive(Debug, Clone)]
pub struct SetClause {
    pub column: String,
    pub value: DatabaseValue,
}

/// How long fetched rows stay in the connection's result cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum CacheLength {
    /// Bypass the cache entirely
    #[default]
    Never,
    /// Cache without expiry
    Forever,
    /// Cache for a number of seconds
    Seconds(u64),
}

impl CacheLength {
    pub fn is_cached(&self) -> bool {
        !matches!(self, CacheLength::Never)
    }

    /// Expiry as a duration, `None` for entries that never expire
    pub fn ttl(&self) -> Option<std::time::Duration> {
        match self {
            CacheLength::Seconds(secs) => Some(std::time::Duration::from_secs(*secs)),
            _ => None,
        }
    }
}

/// Numeric form: -1 never caches, 0 caches forever, n caches for n seconds
impl From<i64> for CacheLength {
    fn from(value: i64) -> Self {
        match value {
            v if v < 0 => CacheLength::Never,
            0 => CacheLength::Forever,
            v => CacheLength::Seconds(v as u64),
        }
    }
}

impl From<CacheLength> for i64 {
    fn from(value: CacheLength) -> Self {
        match value {
            CacheLength::Never => -1,
            CacheLength::Forever => 0,
            CacheLength::Seconds(secs) => i64::try_from(secs).unwrap_or(i64::MAX),
        }
    }
}
