//! Connection - statement helpers over a driver, with caching and logging

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;

use super::dialect::SqlDialect;
use super::driver::{Driver, ExecuteResult};
use super::sqlx_driver::SqlxDriver;
use crate::cache::{cache_key, ResultCache};
use crate::error::OrmResult;
use crate::logging::QueryLogger;
use crate::query::{CacheLength, QueryBuilder};
use crate::value::{DatabaseValue, FieldMap, Row};

/// A database connection as seen by mappers
pub struct Connection {
    driver: Box<dyn Driver>,
    dialect: SqlDialect,
    logger: RwLock<Option<Arc<dyn QueryLogger>>>,
    cache: RwLock<Option<Arc<dyn ResultCache>>>,
    executed: AtomicU64,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("driver", &self.driver.driver_name())
            .field("dialect", &self.dialect)
            .field("has_logger", &self.logger.read().is_some())
            .field("has_cache", &self.cache.read().is_some())
            .field("executed", &self.executed_queries())
            .finish()
    }
}

impl Connection {
    pub fn new(driver: impl Driver + 'static) -> Self {
        Self::from_boxed(Box::new(driver))
    }

    pub fn from_boxed(driver: Box<dyn Driver>) -> Self {
        let dialect = SqlDialect::from_driver_name(driver.driver_name());
        Self {
            driver,
            dialect,
            logger: RwLock::new(None),
            cache: RwLock::new(None),
            executed: AtomicU64::new(0),
        }
    }

    /// Open a connection through [`SqlxDriver`]
    pub fn connect(url: &str) -> OrmResult<Self> {
        Ok(Self::new(SqlxDriver::connect(url)?))
    }

    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    pub fn driver_name(&self) -> &str {
        self.driver.driver_name()
    }

    /// Fresh builder using this connection's dialect
    pub fn query_builder(&self) -> QueryBuilder {
        QueryBuilder::with_dialect(self.dialect)
    }

    pub fn set_logger(&self, logger: Arc<dyn QueryLogger>) {
        *self.logger.write() = Some(logger);
    }

    pub fn logger(&self) -> Option<Arc<dyn QueryLogger>> {
        self.logger.read().clone()
    }

    pub fn set_cache(&self, cache: Arc<dyn ResultCache>) {
        *self.cache.write() = Some(cache);
    }

    pub fn cache(&self) -> Option<Arc<dyn ResultCache>> {
        self.cache.read().clone()
    }

    /// Statements actually sent to the driver; cache hits are not counted
    pub fn executed_queries(&self) -> u64 {
        self.executed.load(Ordering::Relaxed)
    }

    /// Cache key for a statement; see [`cache_key`]
    pub fn create_cache_key(sql: &str, cache_length: CacheLength, params: &[DatabaseValue]) -> String {
        cache_key(sql, cache_length, params)
    }

    /// Insert a row and return the generated id, or `Null` when there is none.
    ///
    /// PostgreSQL reads the id back with `RETURNING *` (first column); other
    /// dialects use the driver's last insert id.
    pub fn insert(&self, table: &str, fields: &FieldMap) -> OrmResult<DatabaseValue> {
        let mut builder = self.query_builder().insert_into(table).set_values(fields);

        if self.dialect.uses_returning_for_insert() {
            builder = builder.returning_all();
            let (sql, params) = builder.to_sql_with_params();
            let rows = self.run_fetch(&sql, params)?;
            let id = rows
                .into_iter()
                .next()
                .and_then(|row| row.into_iter().next())
                .map(|(_, value)| value)
                .unwrap_or(DatabaseValue::Null);
            return Ok(id);
        }

        let (sql, params) = builder.to_sql_with_params();
        let result = self.run_execute(&sql, params)?;
        Ok(result.last_insert_id.map_or(DatabaseValue::Null, DatabaseValue::Int64))
    }

    /// Update rows matching every entry of `condition`; returns affected rows.
    ///
    /// Empty `fields` issue no statement.
    pub fn update(&self, table: &str, fields: &FieldMap, condition: &FieldMap) -> OrmResult<u64> {
        if fields.is_empty() {
            tracing::debug!("Skipping UPDATE on {} with no fields", table);
            return Ok(0);
        }
        let (sql, params) = self
            .query_builder()
            .update(table)
            .set_values(fields)
            .where_fields(condition)
            .to_sql_with_params();
        Ok(self.run_execute(&sql, params)?.rows_affected)
    }

    /// Delete rows matching every entry of `condition`; returns affected rows
    pub fn delete(&self, table: &str, condition: &FieldMap) -> OrmResult<u64> {
        let (sql, params) = self
            .query_builder()
            .delete_from(table)
            .where_fields(condition)
            .to_sql_with_params();
        Ok(self.run_execute(&sql, params)?.rows_affected)
    }

    /// Run a statement that returns no rows; returns affected rows
    pub fn execute(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<u64> {
        Ok(self.run_execute(sql, params.to_vec())?.rows_affected)
    }

    /// Fetch every row, consulting the cache when `cache_length` allows it
    pub fn fetch_all(&self, sql: &str, params: &[DatabaseValue], cache_length: CacheLength) -> OrmResult<Vec<Row>> {
        let params = convert_values(params.to_vec());

        let cache = if cache_length.is_cached() { self.cache() } else { None };
        let Some(cache) = cache else {
            return self.run_fetch(sql, params);
        };

        let key = cache_key(sql, cache_length, &params);
        if let Some(rows) = cache.fetch(&key) {
            tracing::trace!("Cache hit for {}", sql);
            return Ok(rows);
        }
        let rows = self.run_fetch(sql, params)?;
        cache.save(&key, rows.clone(), cache_length);
        Ok(rows)
    }

    /// First row of the result, sharing cache entries with [`Connection::fetch_all`]
    pub fn fetch(&self, sql: &str, params: &[DatabaseValue], cache_length: CacheLength) -> OrmResult<Option<Row>> {
        Ok(self.fetch_all(sql, params, cache_length)?.into_iter().next())
    }

    fn run_execute(&self, sql: &str, params: Vec<DatabaseValue>) -> OrmResult<ExecuteResult> {
        let params = convert_values(params);
        let started = Instant::now();
        let result = self.driver.execute(sql, &params)?;
        self.record(sql, &params, started);
        Ok(result)
    }

    fn run_fetch(&self, sql: &str, params: Vec<DatabaseValue>) -> OrmResult<Vec<Row>> {
        let params = convert_values(params);
        let started = Instant::now();
        let rows = self.driver.fetch_all(sql, &params)?;
        self.record(sql, &params, started);
        Ok(rows)
    }

    fn record(&self, sql: &str, params: &[DatabaseValue], started: Instant) {
        let elapsed = started.elapsed();
        self.executed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("Executed {} ({} params) in {:?}", sql, params.len(), elapsed);
        if let Some(logger) = self.logger() {
            logger.on_query(sql, params, elapsed);
        }
    }
}

/// Prepare values for the driver: date-times are written as RFC 3339 text
fn convert_values(params: Vec<DatabaseValue>) -> Vec<DatabaseValue> {
    params
        .into_iter()
        .map(|value| match value {
            DatabaseValue::DateTime(dt) => DatabaseValue::String(dt.to_rfc3339()),
            DatabaseValue::Array(items) => DatabaseValue::Array(convert_values(items)),
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::logging::QueryLog;
    use chrono::{TimeZone, Utc};
    use parking_lot::Mutex;

    /// Driver that records statements and replays canned rows
    #[derive(Default)]
    struct FakeDriver {
        name: &'static str,
        statements: Arc<Mutex<Vec<(String, Vec<DatabaseValue>)>>>,
        rows: Vec<Row>,
    }

    impl Driver for FakeDriver {
        fn driver_name(&self) -> &str {
            self.name
        }

        fn execute(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<ExecuteResult> {
            self.statements.lock().push((sql.to_string(), params.to_vec()));
            Ok(ExecuteResult {
                rows_affected: 1,
                last_insert_id: Some(12),
            })
        }

        fn fetch_all(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Vec<Row>> {
            self.statements.lock().push((sql.to_string(), params.to_vec()));
            Ok(self.rows.clone())
        }
    }

    fn row(id: i64) -> Row {
        let mut row = Row::new();
        row.insert("id".into(), DatabaseValue::Int64(id));
        row.insert("name".into(), "Alex".into());
        row
    }

    fn fields() -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert("name".into(), "Alex".into());
        fields
    }

    fn fake(name: &'static str, rows: Vec<Row>) -> (Connection, Arc<Mutex<Vec<(String, Vec<DatabaseValue>)>>>) {
        let statements = Arc::new(Mutex::new(Vec::new()));
        let driver = FakeDriver {
            name,
            statements: statements.clone(),
            rows,
        };
        (Connection::new(driver), statements)
    }

    #[test]
    fn test_dialect_follows_driver() {
        assert_eq!(fake("postgres", vec![]).0.dialect(), SqlDialect::PostgreSQL);
        assert_eq!(fake("mysql", vec![]).0.dialect(), SqlDialect::MySQL);
        assert_eq!(fake("sqlite", vec![]).0.dialect(), SqlDialect::SQLite);
        assert_eq!(fake("odbc", vec![]).0.dialect(), SqlDialect::Ansi);
    }

    #[test]
    fn test_insert_uses_last_insert_id() {
        let (conn, statements) = fake("sqlite", vec![]);
        let id = conn.insert("users", &fields()).unwrap();
        assert_eq!(id, DatabaseValue::Int64(12));
        assert_eq!(statements.lock()[0].0, r#"INSERT INTO "users" ("name") VALUES (?)"#);
    }

    #[test]
    fn test_postgres_insert_reads_returning_row() {
        let (conn, statements) = fake("postgres", vec![row(7)]);
        let id = conn.insert("users", &fields()).unwrap();
        assert_eq!(id, DatabaseValue::Int64(7));
        assert!(statements.lock()[0].0.ends_with("RETURNING *"));
    }

    #[test]
    fn test_update_and_delete_sql() {
        let (conn, statements) = fake("sqlite", vec![]);
        let mut condition = FieldMap::new();
        condition.insert("id".into(), DatabaseValue::Int64(1));

        assert_eq!(conn.update("users", &fields(), &condition).unwrap(), 1);
        assert_eq!(conn.delete("users", &condition).unwrap(), 1);
        assert_eq!(conn.update("users", &FieldMap::new(), &condition).unwrap(), 0);

        let statements = statements.lock();
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].0, r#"UPDATE "users" SET "name" = ? WHERE "id" = ?"#);
        assert_eq!(statements[0].1, vec![DatabaseValue::from("Alex"), DatabaseValue::Int64(1)]);
        assert_eq!(statements[1].0, r#"DELETE FROM "users" WHERE "id" = ?"#);
    }

    #[test]
    fn test_datetimes_are_converted() {
        let (conn, statements) = fake("sqlite", vec![]);
        let at = Utc.with_ymd_and_hms(2015, 1, 1, 10, 0, 0).unwrap();
        conn.execute("UPDATE users SET created = ?", &[at.into()]).unwrap();
        assert_eq!(
            statements.lock()[0].1,
            vec![DatabaseValue::from("2015-01-01T10:00:00+00:00")]
        );
    }

    #[test]
    fn test_cached_fetches_hit_the_driver_once() {
        let (conn, statements) = fake("sqlite", vec![row(1)]);
        conn.set_cache(Arc::new(MemoryCache::new()));

        let sql = "SELECT * FROM users WHERE id = ?";
        let params = [DatabaseValue::Int64(1)];
        let first = conn.fetch_all(sql, &params, CacheLength::Forever).unwrap();
        let second = conn.fetch_all(sql, &params, CacheLength::Forever).unwrap();
        let single = conn.fetch(sql, &params, CacheLength::Forever).unwrap();

        assert_eq!(first, second);
        assert_eq!(single, Some(row(1)));
        assert_eq!(statements.lock().len(), 1);
        assert_eq!(conn.executed_queries(), 1);
    }

    #[test]
    fn test_empty_results_are_cached_too() {
        let (conn, statements) = fake("sqlite", vec![]);
        conn.set_cache(Arc::new(MemoryCache::new()));
        assert!(conn.fetch("SELECT * FROM users", &[], CacheLength::Seconds(30)).unwrap().is_none());
        assert!(conn.fetch_all("SELECT * FROM users", &[], CacheLength::Seconds(30)).unwrap().is_empty());
        assert_eq!(statements.lock().len(), 1);
    }

    #[test]
    fn test_cache_lengths_do_not_share_entries() {
        let (conn, statements) = fake("sqlite", vec![row(1)]);
        conn.set_cache(Arc::new(MemoryCache::new()));

        let sql = "SELECT * FROM users";
        conn.fetch_all(sql, &[], CacheLength::Forever).unwrap();
        conn.fetch_all(sql, &[], CacheLength::Seconds(60)).unwrap();
        assert_eq!(statements.lock().len(), 2);

        conn.fetch_all(sql, &[], CacheLength::Seconds(60)).unwrap();
        conn.fetch_all(sql, &[], CacheLength::Forever).unwrap();
        assert_eq!(statements.lock().len(), 2);
    }

    #[test]
    fn test_never_bypasses_cache() {
        let (conn, statements) = fake("sqlite", vec![]);
        conn.set_cache(Arc::new(MemoryCache::new()));
        conn.fetch_all("SELECT 1", &[], CacheLength::Never).unwrap();
        conn.fetch_all("SELECT 1", &[], CacheLength::Never).unwrap();
        assert_eq!(statements.lock().len(), 2);
    }

    #[test]
    fn test_logger_sees_executed_statements_only() {
        let (conn, _) = fake("sqlite", vec![]);
        let log = Arc::new(QueryLog::new());
        conn.set_logger(log.clone());
        conn.set_cache(Arc::new(MemoryCache::new()));

        conn.insert("users", &fields()).unwrap();
        conn.fetch_all("SELECT * FROM users", &[], CacheLength::Forever).unwrap();
        conn.fetch_all("SELECT * FROM users", &[], CacheLength::Forever).unwrap();

        let events = log.events();
        assert_eq!(log.total_queries(), 2);
        assert!(events[0].sql.contains("INSERT"));
        assert_eq!(events[0].params, vec![DatabaseValue::from("Alex")]);
        assert_eq!(events[1].sql, "SELECT * FROM users");
    }

    #[test]
    fn test_create_cache_key_matches_cache_module() {
        let params = [DatabaseValue::from("Alex")];
        assert_eq!(
            Connection::create_cache_key("SELECT ?", CacheLength::Forever, &params),
            cache_key("SELECT ?", CacheLength::Forever, &params)
        );
    }
}
