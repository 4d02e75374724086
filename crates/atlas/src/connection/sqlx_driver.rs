//! Blocking driver over `sqlx::Any`
//!
//! Owns a single connection and a current-thread tokio runtime, and blocks on
//! each statement. Must not be called from inside another tokio runtime.

use parking_lot::Mutex;
use sqlx::any::{AnyArguments, AnyRow};
use sqlx::query::Query;
use sqlx::{Any, AnyConnection, Column, Connection as _, Row as _, ValueRef};

use super::driver::{Driver, ExecuteResult};
use crate::error::{OrmError, OrmResult};
use crate::value::{DatabaseValue, Row};

/// [`Driver`] backed by an `sqlx` connection (sqlite or postgres URLs)
pub struct SqlxDriver {
    // dropped before the runtime it was created on
    connection: Mutex<AnyConnection>,
    runtime: tokio::runtime::Runtime,
    driver_name: String,
}

impl std::fmt::Debug for SqlxDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlxDriver")
            .field("driver_name", &self.driver_name)
            .finish()
    }
}

impl SqlxDriver {
    /// Connect to `url`, e.g. `sqlite::memory:` or `postgres://user@host/db`
    pub fn connect(url: &str) -> OrmResult<Self> {
        sqlx::any::install_default_drivers();

        let driver_name = driver_name_from_url(url)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        tracing::debug!("Opening {} connection", driver_name);
        let connection = runtime.block_on(AnyConnection::connect(url))?;

        Ok(Self {
            connection: Mutex::new(connection),
            runtime,
            driver_name,
        })
    }
}

impl Driver for SqlxDriver {
    fn driver_name(&self) -> &str {
        &self.driver_name
    }

    fn execute(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<ExecuteResult> {
        let query = bind_all(sqlx::query::<Any>(sql), params)?;
        let mut connection = self.connection.lock();
        let result = self.runtime.block_on(query.execute(&mut *connection))?;

        // the sqlite Any backend does not report the rowid itself
        let mut last_insert_id = result.last_insert_id();
        if last_insert_id.is_none() && self.driver_name == "sqlite" && result.rows_affected() > 0 && is_insert(sql) {
            let row = self
                .runtime
                .block_on(sqlx::query::<Any>("SELECT last_insert_rowid()").fetch_one(&mut *connection))?;
            last_insert_id = Some(row.try_get::<i64, _>(0)?);
        }

        Ok(ExecuteResult {
            rows_affected: result.rows_affected(),
            last_insert_id,
        })
    }

    fn fetch_all(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Vec<Row>> {
        let query = bind_all(sqlx::query::<Any>(sql), params)?;
        let mut connection = self.connection.lock();
        let rows = self.runtime.block_on(query.fetch_all(&mut *connection))?;
        rows.iter().map(decode_row).collect()
    }
}

fn is_insert(sql: &str) -> bool {
    sql.trim_start()
        .get(..6)
        .map_or(false, |keyword| keyword.eq_ignore_ascii_case("insert"))
}

fn driver_name_from_url(url: &str) -> OrmResult<String> {
    let scheme = url
        .split_once(':')
        .map(|(scheme, _)| scheme.to_ascii_lowercase())
        .filter(|scheme| !scheme.is_empty())
        .ok_or_else(|| OrmError::Configuration(format!("database URL '{}' has no scheme", url)))?;
    Ok(match scheme.as_str() {
        "postgresql" => "postgres".to_string(),
        _ => scheme,
    })
}

type AnyQuery<'q> = Query<'q, Any, AnyArguments<'q>>;

fn bind_all<'q>(mut query: AnyQuery<'q>, params: &[DatabaseValue]) -> OrmResult<AnyQuery<'q>> {
    for param in params {
        query = match param {
            DatabaseValue::Null => query.bind(Option::<String>::None),
            DatabaseValue::Bool(b) => query.bind(*b),
            DatabaseValue::Int32(i) => query.bind(*i),
            DatabaseValue::Int64(i) => query.bind(*i),
            DatabaseValue::Float32(f) => query.bind(*f),
            DatabaseValue::Float64(f) => query.bind(*f),
            DatabaseValue::String(s) => query.bind(s.clone()),
            DatabaseValue::Bytes(b) => query.bind(b.clone()),
            DatabaseValue::Uuid(u) => query.bind(u.to_string()),
            DatabaseValue::DateTime(dt) => query.bind(dt.to_rfc3339()),
            DatabaseValue::Date(d) => query.bind(d.to_string()),
            DatabaseValue::Time(t) => query.bind(t.to_string()),
            DatabaseValue::Json(j) => query.bind(j.to_string()),
            DatabaseValue::Array(_) => {
                return Err(OrmError::UnsupportedValue(
                    "arrays must be expanded into individual parameters".to_string(),
                ))
            }
        };
    }
    Ok(query)
}

fn decode_row(row: &AnyRow) -> OrmResult<Row> {
    let mut out = Row::with_capacity(row.len());
    for (index, column) in row.columns().iter().enumerate() {
        out.insert(column.name().to_string(), decode_value(row, index)?);
    }
    Ok(out)
}

fn decode_value(row: &AnyRow, index: usize) -> OrmResult<DatabaseValue> {
    if row.try_get_raw(index)?.is_null() {
        return Ok(DatabaseValue::Null);
    }
    if let Ok(v) = row.try_get::<i64, _>(index) {
        return Ok(DatabaseValue::Int64(v));
    }
    if let Ok(v) = row.try_get::<i32, _>(index) {
        return Ok(DatabaseValue::Int32(v));
    }
    if let Ok(v) = row.try_get::<f64, _>(index) {
        return Ok(DatabaseValue::Float64(v));
    }
    if let Ok(v) = row.try_get::<f32, _>(index) {
        return Ok(DatabaseValue::Float32(v));
    }
    if let Ok(v) = row.try_get::<String, _>(index) {
        return Ok(DatabaseValue::String(v));
    }
    if let Ok(v) = row.try_get::<Vec<u8>, _>(index) {
        return Ok(DatabaseValue::Bytes(v));
    }
    if let Ok(v) = row.try_get::<bool, _>(index) {
        return Ok(DatabaseValue::Bool(v));
    }
    Err(OrmError::UnsupportedValue(format!(
        "column '{}' has a type that cannot be decoded",
        row.columns()[index].name()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_name_from_url() {
        assert_eq!(driver_name_from_url("sqlite::memory:").unwrap(), "sqlite");
        assert_eq!(driver_name_from_url("postgresql://localhost/app").unwrap(), "postgres");
        assert_eq!(driver_name_from_url("MYSQL://localhost/app").unwrap(), "mysql");
        assert!(matches!(driver_name_from_url("no-scheme"), Err(OrmError::Configuration(_))));
    }

    #[test]
    fn test_round_trip_through_sqlite() {
        let driver = SqlxDriver::connect("sqlite::memory:").unwrap();
        driver
            .execute("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT, score REAL)", &[])
            .unwrap();
        let result = driver
            .execute(
                "INSERT INTO t (name, score) VALUES (?, ?)",
                &["Alex".into(), DatabaseValue::Float64(1.5)],
            )
            .unwrap();
        assert_eq!(result.rows_affected, 1);
        assert_eq!(result.last_insert_id, Some(1));

        driver
            .execute("INSERT INTO t (name, score) VALUES (?, ?)", &[DatabaseValue::Null, DatabaseValue::Null])
            .unwrap();

        let rows = driver.fetch_all("SELECT id, name, score FROM t ORDER BY id", &[]).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["id"], DatabaseValue::Int64(1));
        assert_eq!(rows[0]["name"], DatabaseValue::from("Alex"));
        assert_eq!(rows[0]["score"], DatabaseValue::Float64(1.5));
        assert!(rows[1]["name"].is_null());
    }

    #[test]
    fn test_sqlite_insert_ids_follow_the_rowid() {
        let driver = SqlxDriver::connect("sqlite::memory:").unwrap();
        driver
            .execute("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)", &[])
            .unwrap();
        for expected in 1..=3 {
            let result = driver
                .execute("insert into t (name) values (?)", &["Alex".into()])
                .unwrap();
            assert_eq!(result.last_insert_id, Some(expected));
        }

        let update = driver.execute("UPDATE t SET name = ?", &["Sam".into()]).unwrap();
        assert_eq!(update.rows_affected, 3);
        assert_eq!(update.last_insert_id, None);
    }

    #[test]
    fn test_is_insert() {
        assert!(is_insert("INSERT INTO t DEFAULT VALUES"));
        assert!(is_insert("  insert into t (a) values (?)"));
        assert!(!is_insert("UPDATE t SET a = 1"));
        assert!(!is_insert("ins"));
    }

    #[test]
    fn test_arrays_are_rejected() {
        let driver = SqlxDriver::connect("sqlite::memory:").unwrap();
        let err = driver
            .fetch_all("SELECT ?", &[DatabaseValue::Array(vec![1.into()])])
            .unwrap_err();
        assert!(matches!(err, OrmError::UnsupportedValue(_)));
    }
}
