//! Shared data types for the QoreFeed engine
//!
//! Normalized result sets returned by every store, and the configuration
//! used to open one.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::engine::connection_url;
use crate::engine::error::EngineResult;

pub use qore_query::Value;

/// A credential that never shows up in `Debug` output or serialized config.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the secret. Only for handing it to a driver.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Store connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub driver: String,
    /// Server host, or the database file path for SQLite
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password: Secret,
    pub database: Option<String>,
    #[serde(default)]
    pub ssl: bool,
    pub pool_max_connections: Option<u32>,
    pub pool_min_connections: Option<u32>,
    pub pool_acquire_timeout_secs: Option<u32>,
}

impl StoreConfig {
    /// Configuration for a SQLite file, or `:memory:`.
    pub fn sqlite(path: impl Into<String>) -> Self {
        Self {
            driver: "sqlite".to_string(),
            host: path.into(),
            port: 0,
            username: String::new(),
            password: Secret::default(),
            database: None,
            ssl: false,
            pool_max_connections: None,
            pool_min_connections: None,
            pool_acquire_timeout_secs: None,
        }
    }

    /// Parses a `sqlite:`, `postgres://` or `mysql://` connection URL.
    pub fn from_url(url: &str) -> EngineResult<Self> {
        connection_url::parse_store_url(url)
    }
}

/// Column metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
}

/// A single row of data (indexed by column order)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Row {
    pub values: Vec<Value>,
}

/// Query execution result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    /// Column information
    pub columns: Vec<ColumnInfo>,
    /// Result rows
    pub rows: Vec<Row>,
    /// Execution time in milliseconds
    pub execution_time_ms: f64,
}

impl QueryResult {
    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            execution_time_ms: 0.0,
        }
    }

    /// Position of the column named `name`, compared case-insensitively.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_is_redacted_in_debug_and_serialization() {
        let mut config = StoreConfig::sqlite(":memory:");
        config.password = Secret::new("hunter2");

        assert!(!format!("{:?}", config).contains("hunter2"));
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(!json.contains("password"));
    }

    #[test]
    fn secret_deserializes_from_plain_string() {
        let json = r#"{"driver":"postgres","host":"db","port":5432,"password":"p","database":null,
            "pool_max_connections":null,"pool_min_connections":null,"pool_acquire_timeout_secs":null}"#;
        let config: StoreConfig = serde_json::from_str(json).expect("should parse");
        assert_eq!(config.password.expose(), "p");
        assert_eq!(config.username, "");
    }

    #[test]
    fn column_index_ignores_case() {
        let result = QueryResult {
            columns: vec![ColumnInfo {
                name: "TAG_NAME".into(),
                data_type: "TEXT".into(),
            }],
            rows: Vec::new(),
            execution_time_ms: 0.0,
        };
        assert_eq!(result.column_index("tag_name"), Some(0));
        assert_eq!(result.column_index("id"), None);
    }
}
