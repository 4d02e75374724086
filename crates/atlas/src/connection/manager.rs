//! Named connection registry handed to mappers

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::core::Connection;
use crate::cache::MemoryCache;
use crate::config::DatabaseConfig;
use crate::error::{OrmError, OrmResult};

/// Connections by name
#[derive(Debug, Default)]
pub struct ConnectionManager {
    connections: RwLock<HashMap<String, Arc<Connection>>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect every configured entry and register it under its name
    pub fn from_config(config: &DatabaseConfig) -> OrmResult<Self> {
        config.validate()?;
        let manager = Self::new();
        for (name, settings) in &config.connections {
            let connection = Connection::connect(&settings.url)?;
            if settings.cache_results {
                let cache = match settings.cache_max_entries {
                    Some(max) => MemoryCache::with_max_entries(max),
                    None => MemoryCache::new(),
                };
                connection.set_cache(Arc::new(cache));
            }
            manager.register(name, connection);
        }
        Ok(manager)
    }

    /// Register (or replace) a connection, returning the shared handle
    pub fn register(&self, name: &str, connection: Connection) -> Arc<Connection> {
        tracing::info!("Registering database connection: {} ({})", name, connection.driver_name());
        let connection = Arc::new(connection);
        self.connections.write().insert(name.to_string(), connection.clone());
        connection
    }

    pub fn connection(&self, name: &str) -> OrmResult<Arc<Connection>> {
        self.connections
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| OrmError::UnknownConnection(name.to_string()))
    }

    /// Registered connection names, sorted
    pub fn registered_connections(&self) -> Vec<String> {
        let mut names: Vec<String> = self.connections.read().keys().cloned().collect();
        names.sort();
        names
    }
}
