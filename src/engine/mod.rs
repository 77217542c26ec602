// Store Engine Module
// Connection, execution and row normalization for every supported SQL store

pub mod connection_url;
pub mod drivers;
pub mod error;
pub mod traits;
pub mod types;

pub use drivers::{connect, connect_url, MySqlStore, PostgresStore, SqliteStore};
pub use error::{EngineError, EngineResult};
pub use traits::FeedStore;
pub use types::*;
