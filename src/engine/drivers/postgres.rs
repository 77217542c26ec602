// SPDX-License-Identifier: Apache-2.0

//! PostgreSQL Driver
//!
//! Implements the FeedStore trait for PostgreSQL databases using SQLx.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use qore_query::{CompiledSql, Dialect};
use sqlx::postgres::{PgArguments, PgConnectOptions, PgPool, PgPoolOptions, PgRow, PgSslMode, Postgres};
use sqlx::{Column, Row, TypeInfo};
use tracing::debug;

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::traits::FeedStore;
use crate::engine::types::{ColumnInfo, QueryResult, Row as QRow, StoreConfig, Value};

/// PostgreSQL store implementation
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn connect(config: &StoreConfig) -> EngineResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.pool_max_connections.unwrap_or(5))
            .min_connections(config.pool_min_connections.unwrap_or(0))
            .acquire_timeout(Duration::from_secs(
                config.pool_acquire_timeout_secs.unwrap_or(30) as u64,
            ))
            .connect_with(Self::build_connect_options(config))
            .await
            .map_err(|e| {
                let msg = e.to_string();
                if msg.contains("password authentication failed") {
                    EngineError::connection_failed(format!("Authentication failed: {}", msg))
                } else {
                    EngineError::connection_failed(msg)
                }
            })?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn build_connect_options(config: &StoreConfig) -> PgConnectOptions {
        let mut opts = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.username)
            .ssl_mode(if config.ssl {
                PgSslMode::Require
            } else {
                PgSslMode::Prefer
            });

        if !config.password.is_empty() {
            opts = opts.password(config.password.expose());
        }
        if let Some(db) = config.database.as_deref() {
            opts = opts.database(db);
        }
        opts
    }

    /// Helper to bind a Value to a Postgres query
    fn bind_param<'q>(
        query: sqlx::query::Query<'q, Postgres, PgArguments>,
        value: &'q Value,
    ) -> sqlx::query::Query<'q, Postgres, PgArguments> {
        match value {
            Value::Null => query.bind(Option::<String>::None),
            Value::Bool(b) => query.bind(*b),
            Value::Int(i) => query.bind(*i),
            Value::Float(f) => query.bind(*f),
            Value::Text(s) => query.bind(s.as_str()),
            Value::Bytes(b) => query.bind(b.as_slice()),
            Value::Json(j) => query.bind(j),
        }
    }

    /// Converts a SQLx row to our universal Row type
    fn convert_row(pg_row: &PgRow) -> QRow {
        let values: Vec<Value> = pg_row
            .columns()
            .iter()
            .map(|col| Self::extract_value(pg_row, col.ordinal()))
            .collect();

        QRow { values }
    }

    /// Extracts a value from a PgRow at the given index
    fn extract_value(row: &PgRow, idx: usize) -> Value {
        // try_get with Option<T> handles NULLs; a type mismatch falls through
        if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
            return v.map(Value::Int).unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<i32>, _>(idx) {
            return v.map(|i| Value::Int(i as i64)).unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<i16>, _>(idx) {
            return v.map(|i| Value::Int(i as i64)).unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<bool>, _>(idx) {
            return v.map(Value::Bool).unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
            return v.map(Value::Float).unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<f32>, _>(idx) {
            return v.map(|f| Value::Float(f as f64)).unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<rust_decimal::Decimal>, _>(idx) {
            return v.map(|d| Value::Text(d.to_string())).unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
            return v.map(Value::Text).unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<uuid::Uuid>, _>(idx) {
            return v.map(|u| Value::Text(u.to_string())).unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(idx) {
            return v.map(Value::Bytes).unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<serde_json::Value>, _>(idx) {
            return v.map(Value::Json).unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(idx) {
            return v.map(|dt| Value::Text(dt.to_rfc3339())).unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<chrono::NaiveDateTime>, _>(idx) {
            return v
                .map(|dt| Value::Text(dt.format("%Y-%m-%d %H:%M:%S").to_string()))
                .unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<chrono::NaiveDate>, _>(idx) {
            return v
                .map(|d| Value::Text(d.format("%Y-%m-%d").to_string()))
                .unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<chrono::NaiveTime>, _>(idx) {
            return v
                .map(|t| Value::Text(t.format("%H:%M:%S").to_string()))
                .unwrap_or(Value::Null);
        }

        Value::Null
    }

    /// Gets column info from a PgRow
    fn get_column_info(row: &PgRow) -> Vec<ColumnInfo> {
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
impl FeedStore for PostgresStore {
    fn driver_id(&self) -> &'static str {
        "postgres"
    }

    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn fetch(&self, query: &CompiledSql) -> EngineResult<QueryResult> {
        let start = Instant::now();

        let mut q = sqlx::query(&query.sql);
        for param in &query.params {
            q = Self::bind_param(q, param);
        }

        let pg_rows: Vec<PgRow> = q
            .fetch_all(&self.pool)
            .await
            .map_err(|e| EngineError::execution_error(e.to_string()))?;

        let execution_time_ms = start.elapsed().as_micros() as f64 / 1000.0;
        debug!(rows = pg_rows.len(), execution_time_ms, "postgres fetch");

        let Some(first) = pg_rows.first() else {
            return Ok(QueryResult {
                execution_time_ms,
                ..QueryResult::empty()
            });
        };

        Ok(QueryResult {
            columns: Self::get_column_info(first),
            rows: pg_rows.iter().map(Self::convert_row).collect(),
            execution_time_ms,
        })
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
