// SPDX-License-Identifier: Apache-2.0

//! Feed engine.
//!
//! Combines tagged queries over different record types into one virtual
//! feed that can be ordered, windowed, counted and materialized back into
//! full records.

pub mod compiler;
pub mod data_feed;
pub mod dialect;
pub mod executor;
pub mod registry;
pub mod settings;
pub mod types;

pub use data_feed::{DataFeed, FeedId, MAX_PAGE_SIZE};
pub use registry::FeedRegistry;
pub use settings::FeedSettings;
pub use types::{FeedItem, FeedPage, FeedRecord, FeedRow, FeedSource, IntoFeedItem, Record, RecordKey};
