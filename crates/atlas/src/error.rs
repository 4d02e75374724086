//! Error types for the mapper, connection and query layers

/// Result type alias for atlas operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for atlas operations
#[derive(Debug, thiserror::Error)]
pub enum OrmError {
    /// A condition could not be derived because the model has no identity
    #[error("Unable to generate {operation} condition for table '{table}': model has no identity")]
    MissingIdentity {
        operation: &'static str,
        table: String,
    },

    /// A pipeline step with this name is already registered
    #[error("Pipeline step '{0}' is already registered")]
    DuplicateStep(String),

    /// A query was executed without a mapper attached
    #[error("Mapper not set for query!")]
    UnboundQuery,

    /// No connection registered under the requested name
    #[error("Unknown connection '{0}'")]
    UnknownConnection(String),

    /// Driver error, passed through untouched
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The model does not carry a mapper binding
    #[error("Model is not bound to a mapper")]
    UnboundModel,

    /// A stored value could not be converted to the requested type
    #[error("Cannot convert {found} to {expected}")]
    Conversion {
        expected: &'static str,
        found: String,
    },

    /// A customised pipeline produced a value of the wrong shape
    #[error("Pipeline produced an unexpected value, expected {0}")]
    UnexpectedStage(&'static str),

    /// The value cannot be bound as a statement parameter
    #[error("Unsupported parameter value: {0}")]
    UnsupportedValue(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl OrmError {
    pub(crate) fn missing_identity(operation: &'static str, table: &str) -> Self {
        OrmError::MissingIdentity {
            operation,
            table: table.to_string(),
        }
    }

    pub(crate) fn conversion(expected: &'static str, found: impl std::fmt::Debug) -> Self {
        OrmError::Conversion {
            expected,
            found: format!("{:?}", found),
        }
    }

    /// Whether this error came from the database driver
    pub fn is_database(&self) -> bool {
        matches!(self, OrmError::Database(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_identity_message() {
        let err = OrmError::missing_identity("an update", "users");
        assert_eq!(
            err.to_string(),
            "Unable to generate an update condition for table 'users': model has no identity"
        );
    }

    #[test]
    fn test_unbound_query_message() {
        assert_eq!(OrmError::UnboundQuery.to_string(), "Mapper not set for query!");
    }

    #[test]
    fn test_sqlx_errors_keep_their_source() {
        let err: OrmError = sqlx::Error::RowNotFound.into();
        assert!(err.is_database());
        assert!(std::error::Error::source(&err).is_some());
    }
}
