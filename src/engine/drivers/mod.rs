// SPDX-License-Identifier: Apache-2.0

// Store drivers module

pub mod mysql;
pub mod postgres;
pub mod sqlite;

use std::sync::Arc;

use qore_query::Dialect;
use tracing::info;

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::traits::FeedStore;
use crate::engine::types::StoreConfig;

pub use mysql::MySqlStore;
pub use postgres::PostgresStore;
pub use sqlite::SqliteStore;

/// Opens the store named by `config.driver`.
pub async fn connect(config: &StoreConfig) -> EngineResult<Arc<dyn FeedStore>> {
    let dialect = Dialect::from_driver_id(&config.driver)
        .ok_or_else(|| EngineError::driver_not_found(config.driver.clone()))?;

    let store: Arc<dyn FeedStore> = match dialect {
        Dialect::Postgres => Arc::new(PostgresStore::connect(config).await?),
        Dialect::MySql => Arc::new(MySqlStore::connect(config).await?),
        Dialect::Sqlite => Arc::new(SqliteStore::connect(config).await?),
    };

    info!(driver = store.driver_id(), host = %config.host, "store connected");
    Ok(store)
}

/// Opens a store from a connection URL.
pub async fn connect_url(url: &str) -> EngineResult<Arc<dyn FeedStore>> {
    connect(&StoreConfig::from_url(url)?).await
}
