//! FeedStore trait definition
//!
//! This is the abstraction every backing store implements. A feed only ever
//! reads, so the surface is one parameterized fetch plus enough metadata to
//! pick the right SQL dialect.

use async_trait::async_trait;
use qore_query::{CompiledSql, Dialect};

use crate::engine::error::EngineResult;
use crate::engine::types::QueryResult;

/// Core trait that all store drivers must implement
///
/// Each driver (PostgreSQL, MySQL, SQLite) owns a connection pool and turns
/// rendered SQL plus its positional parameters into a normalized
/// [`QueryResult`].
#[async_trait]
pub trait FeedStore: Send + Sync {
    /// Returns the unique identifier for this driver (e.g., "postgres", "mysql", "sqlite")
    fn driver_id(&self) -> &'static str;

    /// SQL dialect the store speaks
    fn dialect(&self) -> Dialect;

    /// Executes a read query and returns every row it produces
    ///
    /// `query.params` are bound positionally, in the order the placeholders
    /// appear in `query.sql`.
    async fn fetch(&self, query: &CompiledSql) -> EngineResult<QueryResult>;

    /// Closes the underlying pool
    async fn close(&self) {}
}
