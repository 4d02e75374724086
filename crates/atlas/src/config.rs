//! Connection configuration
//!
//! Loaded from YAML or the environment and turned into live connections by
//! `ConnectionManager::from_config`.
//!
//! ```yaml
//! connections:
//!   default:
//!     url: "sqlite::memory:"
//!     cache_results: true
//!   reporting:
//!     url: "postgres://reader@db/reports"
//! ```

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{OrmError, OrmResult};
use crate::mapper::DEFAULT_CONNECTION;

/// Environment variable holding the URL of the default connection
pub const DATABASE_URL_ENV: &str = "ATLAS_DATABASE_URL";

/// Settings for a single named connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub url: String,
    /// Attach an in-memory result cache
    #[serde(default)]
    pub cache_results: bool,
    /// Upper bound on cached result sets, unbounded when absent
    #[serde(default)]
    pub cache_max_entries: Option<usize>,
}

impl ConnectionConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            cache_results: false,
            cache_max_entries: None,
        }
    }

    pub fn with_cache(mut self, max_entries: Option<usize>) -> Self {
        self.cache_results = true;
        self.cache_max_entries = max_entries;
        self
    }
}

/// Every connection an application uses, by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub connections: IndexMap<String, ConnectionConfig>,
}

impl DatabaseConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_connection(mut self, name: impl Into<String>, config: ConnectionConfig) -> Self {
        self.connections.insert(name.into(), config);
        self
    }

    pub fn from_yaml_str(yaml: &str) -> OrmResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> OrmResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Default connection from `ATLAS_DATABASE_URL`
    pub fn from_env() -> OrmResult<Self> {
        let url = std::env::var(DATABASE_URL_ENV)
            .map_err(|_| OrmError::Configuration(format!("{} is not set", DATABASE_URL_ENV)))?;
        let config = Self::new().with_connection(DEFAULT_CONNECTION, ConnectionConfig::new(url));
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> OrmResult<()> {
        for (name, connection) in &self.connections {
            if connection.url.trim().is_empty() {
                return Err(OrmError::Configuration(format!("connection '{}' has an empty url", name)));
            }
            if connection.cache_max_entries == Some(0) {
                return Err(OrmError::Configuration(format!(
                    "connection '{}' sets cache_max_entries to 0",
                    name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml() {
        let config = DatabaseConfig::from_yaml_str(
            r#"
connections:
  default:
    url: "sqlite::memory:"
    cache_results: true
    cache_max_entries: 100
  reporting:
    url: "postgres://reader@db/reports"
"#,
        )
        .unwrap();

        assert_eq!(config.connections.len(), 2);
        let default = &config.connections["default"];
        assert!(default.cache_results);
        assert_eq!(default.cache_max_entries, Some(100));
        assert!(!config.connections["reporting"].cache_results);
        assert_eq!(config.connections.keys().collect::<Vec<_>>(), vec!["default", "reporting"]);
    }

    #[test]
    fn test_rejects_empty_url() {
        let err = DatabaseConfig::from_yaml_str("connections:\n  default:\n    url: \"\"\n").unwrap_err();
        assert!(matches!(err, OrmError::Configuration(_)));
    }

    #[test]
    fn test_bad_yaml_is_reported() {
        assert!(matches!(
            DatabaseConfig::from_yaml_str("connections: [unclosed"),
            Err(OrmError::Yaml(_))
        ));
    }

    #[test]
    fn test_builder() {
        let config = DatabaseConfig::new()
            .with_connection("default", ConnectionConfig::new("sqlite::memory:").with_cache(Some(10)));
        assert!(config.validate().is_ok());
        assert_eq!(config.connections["default"].cache_max_entries, Some(10));
    }
}
