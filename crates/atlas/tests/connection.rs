//! Connection, cache and configuration against a real sqlite driver

use std::sync::Arc;

use atlas::{
    CacheLength, Connection, ConnectionManager, DatabaseConfig, DatabaseValue, FieldMap, MemoryCache, OrmError,
    QueryLog, ResultCache, SqlDialect, TracingLogger,
};

fn users() -> Connection {
    let connection = Connection::connect("sqlite::memory:").unwrap();
    connection
        .execute("CREATE TABLE users (id INTEGER PRIMARY KEY, name varchar(32))", &[])
        .unwrap();
    connection
}

fn named(name: &str) -> FieldMap {
    let mut fields = FieldMap::new();
    fields.insert("name".into(), name.into());
    fields
}

fn by_id(id: i64) -> FieldMap {
    let mut condition = FieldMap::new();
    condition.insert("id".into(), DatabaseValue::Int64(id));
    condition
}

#[test]
fn test_sqlite_dialect_is_detected() {
    let connection = users();
    assert_eq!(connection.driver_name(), "sqlite");
    assert_eq!(connection.dialect(), SqlDialect::SQLite);
}

#[test]
fn test_insert_update_delete_round_trip() {
    let connection = users();

    assert_eq!(connection.insert("users", &named("Alex")).unwrap(), DatabaseValue::Int64(1));
    assert_eq!(connection.insert("users", &named("Lucie")).unwrap(), DatabaseValue::Int64(2));

    assert_eq!(connection.update("users", &named("Sam"), &by_id(2)).unwrap(), 1);
    let row = connection
        .fetch("SELECT name FROM users WHERE id = ?", &[2.into()], CacheLength::Never)
        .unwrap()
        .unwrap();
    assert_eq!(row.get("name"), Some(&DatabaseValue::from("Sam")));

    assert_eq!(connection.delete("users", &by_id(1)).unwrap(), 1);
    assert_eq!(connection.delete("users", &by_id(1)).unwrap(), 0);
    let rows = connection.fetch_all("SELECT * FROM users", &[], CacheLength::Never).unwrap();
    assert_eq!(rows.len(), 1);
}

#[test]
fn test_null_values_are_written_and_read() {
    let connection = users();
    let mut fields = FieldMap::new();
    fields.insert("name".into(), DatabaseValue::Null);
    connection.insert("users", &fields).unwrap();

    let row = connection
        .fetch("SELECT name FROM users", &[], CacheLength::Never)
        .unwrap()
        .unwrap();
    assert_eq!(row.get("name"), Some(&DatabaseValue::Null));
}

#[test]
fn test_cached_results_survive_table_changes() {
    let connection = users();
    let cache = Arc::new(MemoryCache::new());
    connection.set_cache(cache.clone());
    connection.insert("users", &named("Alex")).unwrap();

    let sql = "SELECT * FROM users";
    assert_eq!(connection.fetch_all(sql, &[], CacheLength::Seconds(60)).unwrap().len(), 1);
    connection.insert("users", &named("Lucie")).unwrap();

    // cached copy until the entry is dropped
    assert_eq!(connection.fetch_all(sql, &[], CacheLength::Seconds(60)).unwrap().len(), 1);
    assert_eq!(connection.fetch_all(sql, &[], CacheLength::Never).unwrap().len(), 2);

    cache.remove(&Connection::create_cache_key(sql, CacheLength::Seconds(60), &[]));
    assert_eq!(connection.fetch_all(sql, &[], CacheLength::Seconds(60)).unwrap().len(), 2);

    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.entries, 1);
}

#[test]
fn test_logger_times_each_statement() {
    let connection = users();
    let log = Arc::new(QueryLog::new());
    connection.set_logger(log.clone());

    connection.insert("users", &named("Alex")).unwrap();
    connection.fetch_all("SELECT * FROM users", &[], CacheLength::Never).unwrap();

    assert_eq!(log.total_queries(), 2);
    assert_eq!(
        log.total_time(),
        log.events().iter().map(|event| event.elapsed).sum()
    );
    log.clear();
    assert_eq!(log.total_queries(), 0);
}

#[test]
fn test_tracing_logger_accepts_statements() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("atlas=debug")
        .with_test_writer()
        .try_init();

    let connection = users();
    connection.set_logger(Arc::new(TracingLogger));
    connection.insert("users", &named("Alex")).unwrap();
    assert_eq!(connection.executed_queries(), 2);
}

#[test]
fn test_database_errors_are_wrapped() {
    let connection = users();
    let err = connection.execute("SELECT * FROM missing_table", &[]).unwrap_err();
    assert!(err.is_database());
    assert!(matches!(err, OrmError::Database(_)));
}

#[test]
fn test_manager_from_yaml_config() {
    let config = DatabaseConfig::from_yaml_str(
        r#"
connections:
  default:
    url: "sqlite::memory:"
    cache_results: true
    cache_max_entries: 16
  reporting:
    url: "sqlite::memory:"
"#,
    )
    .unwrap();

    let manager = ConnectionManager::from_config(&config).unwrap();
    assert_eq!(manager.registered_connections(), vec!["default", "reporting"]);

    let default = manager.connection("default").unwrap();
    assert!(default.cache().is_some());
    assert_eq!(default.dialect(), SqlDialect::SQLite);
    assert!(manager.connection("reporting").unwrap().cache().is_none());
    assert!(matches!(manager.connection("audit"), Err(OrmError::UnknownConnection(_))));
}

#[test]
fn test_invalid_config_is_rejected() {
    let err = DatabaseConfig::from_yaml_str(
        r#"
connections:
  default:
    url: ""
"#,
    )
    .unwrap_err();
    assert!(matches!(err, OrmError::Configuration(_)));

    assert!(matches!(
        DatabaseConfig::from_yaml_str("connections: [1, 2]"),
        Err(OrmError::Yaml(_))
    ));
}
