//! # atlas: data-mapper persistence
//!
//! Plain model types are mapped to database rows through per-model mappers.
//! Every mapper operation (create, update, delete, load, fetch) runs through a
//! named pipeline that a mapping can extend, replace or trim. Query results
//! are hydrated into models lazily and memoized per index.
//!
//! The connection layer is a thin wrapper over a blocking driver with optional
//! result caching and query logging. `SqlxDriver` provides sqlite and postgres
//! through `sqlx`.

pub mod cache;
pub mod config;
pub mod connection;
pub mod error;
pub mod logging;
pub mod mapper;
pub mod model;
pub mod pipeline;
pub mod populate;
pub mod query;
pub mod results;
pub mod util;
pub mod value;

// Re-export core traits and types
pub use cache::{MemoryCache, ResultCache};
pub use config::{ConnectionConfig, DatabaseConfig};
pub use connection::{Connection, ConnectionManager, Driver, SqlDialect, SqlxDriver};
pub use error::{OrmError, OrmResult};
pub use logging::{QueryEvent, QueryLog, QueryLogger, TracingLogger};
pub use mapper::{DatabaseMapper, Fetched, Mapper, Mapping, DEFAULT_CONNECTION};
pub use model::{Crud, Entity, HasIdentity, HasTimestamps, Timestamps};
pub use pipeline::Pipeline;
pub use populate::Properties;
pub use query::{CacheLength, QueryBuilder, QueryOperator, Select};
pub use results::{Entry, Results};
pub use value::{DatabaseValue, FieldMap, FromValue, Row};
