// SPDX-License-Identifier: Apache-2.0

//! SQLite Driver
//!
//! Implements the FeedStore trait for SQLite databases using SQLx.
//!
//! ## SQLite Specifics
//!
//! - SQLite is a file-based database, so `host` in StoreConfig contains the file path
//! - Supports `:memory:` for in-memory databases
//! - Uses WAL mode for file databases

use std::str::FromStr;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use qore_query::{CompiledSql, Dialect};
use sqlx::sqlite::{
    Sqlite, SqliteArguments, SqliteConnectOptions, SqliteJournalMode, SqlitePool,
    SqlitePoolOptions, SqliteRow,
};
use sqlx::{Column, Row, TypeInfo};
use tracing::debug;

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::traits::FeedStore;
use crate::engine::types::{ColumnInfo, QueryResult, Row as QRow, StoreConfig, Value};

fn is_memory(path: &str) -> bool {
    matches!(path.trim(), ":memory:" | "sqlite::memory:")
}

/// SQLite store implementation
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens a pool for the database described by `config`.
    pub async fn connect(config: &StoreConfig) -> EngineResult<Self> {
        Self::validate_path(&config.host)?;

        let memory = is_memory(&config.host);
        // Every connection to `:memory:` is a separate database, so keep exactly one alive.
        let max_connections = if memory {
            1
        } else {
            config.pool_max_connections.unwrap_or(5)
        };
        let min_connections = if memory {
            1
        } else {
            config.pool_min_connections.unwrap_or(0)
        };
        let acquire_timeout = config.pool_acquire_timeout_secs.unwrap_or(30);

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(acquire_timeout as u64));
        if memory {
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(Self::build_connect_options(config)?)
            .await
            .map_err(|e| EngineError::connection_failed(e.to_string()))?;

        Ok(Self { pool })
    }

    /// Wraps an existing pool.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// The underlying pool, for schema setup and seeding.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn build_connect_options(config: &StoreConfig) -> EngineResult<SqliteConnectOptions> {
        let path = config.host.trim();

        if is_memory(path) {
            return SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| EngineError::connection_failed(e.to_string()));
        }

        Ok(SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(30)))
    }

    /// Validates the SQLite connection path
    fn validate_path(path: &str) -> EngineResult<()> {
        let path = path.trim();

        if is_memory(path) {
            return Ok(());
        }

        if path.is_empty() {
            return Err(EngineError::connection_failed("SQLite path cannot be empty."));
        }

        if path.eq_ignore_ascii_case("localhost") || path.contains("://") {
            return Err(EngineError::connection_failed(format!(
                "Invalid SQLite path: '{}'. Please select a valid file path.",
                path
            )));
        }

        Ok(())
    }

    /// Helper to bind a Value to a SQLite query
    fn bind_param<'q>(
        query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
        value: &'q Value,
    ) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
        match value {
            Value::Null => query.bind(Option::<String>::None),
            Value::Bool(b) => query.bind(*b),
            Value::Int(i) => query.bind(*i),
            Value::Float(f) => query.bind(*f),
            Value::Text(s) => query.bind(s.as_str()),
            Value::Bytes(b) => query.bind(b.as_slice()),
            Value::Json(j) => query.bind(j.to_string()),
        }
    }

    /// Converts a SQLx row to our universal Row type
    fn convert_row(sqlite_row: &SqliteRow) -> QRow {
        let values: Vec<Value> = sqlite_row
            .columns()
            .iter()
            .map(|col| Self::extract_value(sqlite_row, col.ordinal()))
            .collect();

        QRow { values }
    }

    /// Extracts a value from a SqliteRow at the given index
    ///
    /// SQLite has dynamic typing, so we try multiple types in order of likelihood
    fn extract_value(row: &SqliteRow, idx: usize) -> Value {
        if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
            return v.map(Value::Int).unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
            return v.map(Value::Float).unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
            return v.map(Value::Text).unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(idx) {
            return v.map(Value::Bytes).unwrap_or(Value::Null);
        }

        Value::Null
    }

    /// Gets column info from a SqliteRow
    fn get_column_info(row: &SqliteRow) -> Vec<ColumnInfo> {
        row.columns()
            .iter()
            .map(|col| ColumnInfo {
                name: col.name().to_string(),
                data_type: col.type_info().name().to_string(),
            })
            .collect()
    }
}

#[async_trait]
impl FeedStore for SqliteStore {
    fn driver_id(&self) -> &'static str {
        "sqlite"
    }

    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn fetch(&self, query: &CompiledSql) -> EngineResult<QueryResult> {
        let start = Instant::now();

        let mut q = sqlx::query(&query.sql);
        for param in &query.params {
            q = Self::bind_param(q, param);
        }

        let sqlite_rows: Vec<SqliteRow> = q
            .fetch_all(&self.pool)
            .await
            .map_err(|e| EngineError::execution_error(e.to_string()))?;

        let execution_time_ms = start.elapsed().as_micros() as f64 / 1000.0;
        debug!(rows = sqlite_rows.len(), execution_time_ms, "sqlite fetch");

        let Some(first) = sqlite_rows.first() else {
            return Ok(QueryResult {
                execution_time_ms,
                ..QueryResult::empty()
            });
        };

        Ok(QueryResult {
            columns: Self::get_column_info(first),
            rows: sqlite_rows.iter().map(Self::convert_row).collect(),
            execution_time_ms,
        })
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
