//! SQL dialects: placeholder and quoting rules per database family

use std::fmt;

/// SQL dialect enumeration for generating database-specific SQL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SqlDialect {
    PostgreSQL,
    MySQL,
    SQLite,
    /// Generic SQL for unrecognised drivers
    #[default]
    Ansi,
}

impl SqlDialect {
    /// Pick the dialect for a driver name such as `"postgres"` or `"sqlite"`
    pub fn from_driver_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pgsql" => SqlDialect::PostgreSQL,
            "mysql" | "mariadb" => SqlDialect::MySQL,
            "sqlite" | "sqlite3" => SqlDialect::SQLite,
            _ => SqlDialect::Ansi,
        }
    }

    /// Get the parameter placeholder for the zero-based parameter `index`
    pub fn parameter_placeholder(&self, index: usize) -> String {
        match self {
            SqlDialect::PostgreSQL => format!("${}", index + 1),
            SqlDialect::MySQL | SqlDialect::SQLite | SqlDialect::Ansi => "?".to_string(),
        }
    }

    /// Get the quote character for identifiers in this dialect
    pub fn identifier_quote(&self) -> char {
        match self {
            SqlDialect::MySQL => '`',
            SqlDialect::PostgreSQL | SqlDialect::SQLite | SqlDialect::Ansi => '"',
        }
    }

    /// Quote an identifier, quoting each part of a dotted name separately
    pub fn quote_identifier(&self, identifier: &str) -> String {
        let quote = self.identifier_quote();
        identifier
            .split('.')
            .map(|part| {
                let escaped = part.replace(quote, &format!("{}{}", quote, quote));
                format!("{}{}{}", quote, escaped, quote)
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Whether inserts should ask for the new row back instead of relying on
    /// the driver's last insert id
    pub fn uses_returning_for_insert(&self) -> bool {
        matches!(self, SqlDialect::PostgreSQL)
    }
}

impl fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SqlDialect::PostgreSQL => "postgresql",
            SqlDialect::MySQL => "mysql",
            SqlDialect::SQLite => "sqlite",
            SqlDialect::Ansi => "ansi",
        };
        f.write_str(name)
    }
}
