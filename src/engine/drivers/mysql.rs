//! MySQL Driver
//!
//! Implements the FeedStore trait for MySQL/MariaDB databases using SQLx.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use qore_query::{CompiledSql, Dialect};
use sqlx::mysql::{
    MySql, MySqlArguments, MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow,
    MySqlSslMode,
};
use sqlx::{Column, Row, TypeInfo};
use tracing::debug;

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::traits::FeedStore;
use crate::engine::types::{ColumnInfo, QueryResult, Row as QRow, StoreConfig, Value};

/// MySQL store implementation
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub async fn connect(config: &StoreConfig) -> EngineResult<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(config.pool_max_connections.unwrap_or(5))
            .min_connections(config.pool_min_connections.unwrap_or(0))
            .acquire_timeout(Duration::from_secs(
                config.pool_acquire_timeout_secs.unwrap_or(30) as u64,
            ))
            .connect_with(Self::build_connect_options(config))
            .await
            .map_err(|e| {
                let msg = e.to_string();
                if msg.contains("Access denied") {
                    EngineError::connection_failed(format!("Authentication failed: {}", msg))
                } else {
                    EngineError::connection_failed(msg)
                }
            })?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    fn build_connect_options(config: &StoreConfig) -> MySqlConnectOptions {
        let mut opts = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.username)
            .ssl_mode(if config.ssl {
                MySqlSslMode::Required
            } else {
                MySqlSslMode::Disabled
            });

        if !config.password.is_empty() {
            opts = opts.password(config.password.expose());
        }
        if let Some(db) = config.database.as_deref() {
            opts = opts.database(db);
        }
        opts
    }

    fn bind_param<'q>(
        query: sqlx::query::Query<'q, MySql, MySqlArguments>,
        value: &'q Value,
    ) -> sqlx::query::Query<'q, MySql, MySqlArguments> {
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
    fn convert_row(mysql_row: &MySqlRow) -> QRow {
        let values: Vec<Value> = mysql_row
            .columns()
            .iter()
            .map(|col| Self::extract_value(mysql_row, col.ordinal()))
            .collect();

        QRow { values }
    }

    /// Extracts a value from a MySqlRow at the given index
    fn extract_value(row: &MySqlRow, idx: usize) -> Value {
        // Try u64 first for BIGINT UNSIGNED columns
        if let Ok(v) = row.try_get::<Option<u64>, _>(idx) {
            return v.map(|u| Value::Int(u as i64)).unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
            return v.map(Value::Int).unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<i32>, _>(idx) {
            return v.map(|i| Value::Int(i as i64)).unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<u32>, _>(idx) {
            return v.map(|u| Value::Int(u as i64)).unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<i16>, _>(idx) {
            return v.map(|i| Value::Int(i as i64)).unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<i8>, _>(idx) {
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
        if let Ok(v) = row.try_get::<Option<serde_json::Value>, _>(idx) {
            return v.map(Value::Json).unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(idx) {
            // Literal strings in a UNION can come back flagged as binary
            return match v {
                Some(bytes) => match String::from_utf8(bytes) {
                    Ok(text) => Value::Text(text),
                    Err(e) => Value::Bytes(e.into_bytes()),
                },
                None => Value::Null,
            };
        }

        Value::Null
    }

    /// Gets column info from a MySqlRow
    fn get_column_info(row: &MySqlRow) -> Vec<ColumnInfo> {
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
impl FeedStore for MySqlStore {
    fn driver_id(&self) -> &'static str {
        "mysql"
    }

    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    async fn fetch(&self, query: &CompiledSql) -> EngineResult<QueryResult> {
        let start = Instant::now();

        let mut q = sqlx::query(&query.sql);
        for param in &query.params {
            q = Self::bind_param(q, param);
        }

        let mysql_rows: Vec<MySqlRow> = q
            .fetch_all(&self.pool)
            .await
            .map_err(|e| EngineError::execution_error(e.to_string()))?;

        let execution_time_ms = start.elapsed().as_micros() as f64 / 1000.0;
        debug!(rows = mysql_rows.len(), execution_time_ms, "mysql fetch");

        let Some(first) = mysql_rows.first() else {
            return Ok(QueryResult {
                execution_time_ms,
                ..QueryResult::empty()
            });
        };

        Ok(QueryResult {
            columns: Self::get_column_info(first),
            rows: mysql_rows.iter().map(Self::convert_row).collect(),
            execution_time_ms,
        })
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
