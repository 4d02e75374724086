//! Query logging
//!
//! Connections report every executed statement to an attached
//! [`QueryLogger`]. Cache hits never reach the database and are not reported.

use std::time::Duration;

use parking_lot::Mutex;

use crate::value::DatabaseValue;

/// Receives one call per statement sent to the database
pub trait QueryLogger: Send + Sync {
    fn on_query(&self, sql: &str, params: &[DatabaseValue], elapsed: Duration);
}

/// A single logged statement
#[derive(Debug, Clone, PartialEq)]
pub struct QueryEvent {
    pub sql: String,
    pub params: Vec<DatabaseValue>,
    pub elapsed: Duration,
}

/// Logger that records every statement in memory
#[derive(Debug, Default)]
pub struct QueryLog {
    events: Mutex<Vec<QueryEvent>>,
}

impl QueryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_queries(&self) -> usize {
        self.events.lock().len()
    }

    pub fn total_time(&self) -> Duration {
        self.events.lock().iter().map(|e| e.elapsed).sum()
    }

    /// Snapshot of the recorded events, oldest first
    pub fn events(&self) -> Vec<QueryEvent> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl QueryLogger for QueryLog {
    fn on_query(&self, sql: &str, params: &[DatabaseValue], elapsed: Duration) {
        self.events.lock().push(QueryEvent {
            sql: sql.to_string(),
            params: params.to_vec(),
            elapsed,
        });
    }
}

/// Logger forwarding statements to `tracing` at INFO level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl QueryLogger for TracingLogger {
    fn on_query(&self, sql: &str, params: &[DatabaseValue], elapsed: Duration) {
        tracing::info!(target: "atlas::query", "{} ({} params) in {:?}", sql, params.len(), elapsed);
    }
}
