// QoreFeed - federated feeds over heterogeneous SQL queries
// Core library

pub mod engine;
pub mod feed;
pub mod metrics;
pub mod observability;

pub use engine::{
    connect, connect_url, EngineError, EngineResult, FeedStore, MySqlStore, PostgresStore,
    SqliteStore, StoreConfig,
};
pub use feed::{DataFeed, FeedItem, FeedPage, FeedRecord, FeedSettings, IntoFeedItem, Record};
pub use qore_query::{Dialect, Model, Operator, SelectQuery, SortDirection, Value};
