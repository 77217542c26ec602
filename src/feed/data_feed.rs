// SPDX-License-Identifier: Apache-2.0

//! DataFeed: the public face of the feed engine.

use std::fmt;
use std::sync::{Arc, OnceLock};

use qore_query::{Bindings, SortDirection, UnionQuery};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::engine::error::EngineResult;
use crate::engine::traits::FeedStore;

use super::compiler;
use super::executor;
use super::registry::FeedRegistry;
use super::settings::FeedSettings;
use super::types::{FeedPage, FeedRecord, FeedSource, IntoFeedItem};

/// Upper bound for [`DataFeed::paginate`] page sizes.
pub const MAX_PAGE_SIZE: u64 = 10_000;

/// Identifies a feed instance in traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeedId(pub Uuid);

impl FeedId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FeedId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Combines several tagged queries into one sortable, pageable feed.
///
/// Sources are projected to `(id, tag, sort value)`, unioned, windowed, and
/// then rehydrated into full records with one batched fetch per tag.
pub struct DataFeed {
    id: FeedId,
    store: Arc<dyn FeedStore>,
    settings: FeedSettings,
    registry: FeedRegistry,
    limit: Option<u64>,
    offset: Option<u64>,
    compiled: OnceLock<UnionQuery>,
}

impl fmt::Debug for DataFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataFeed")
            .field("id", &self.id)
            .field("driver", &self.store.driver_id())
            .field("settings", &self.settings)
            .field("sources", &self.registry.tags().collect::<Vec<_>>())
            .field("limit", &self.limit)
            .field("offset", &self.offset)
            .field("compiled", &self.compiled.get().is_some())
            .finish()
    }
}

impl DataFeed {
    pub fn new(store: Arc<dyn FeedStore>) -> Self {
        Self::with_settings(store, FeedSettings::default())
    }

    pub fn with_settings(store: Arc<dyn FeedStore>, settings: FeedSettings) -> Self {
        Self {
            id: FeedId::new(),
            store,
            settings,
            registry: FeedRegistry::new(),
            limit: None,
            offset: None,
            compiled: OnceLock::new(),
        }
    }

    pub fn id(&self) -> FeedId {
        self.id
    }

    pub fn settings(&self) -> &FeedSettings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<dyn FeedStore> {
        &self.store
    }

    /// Registered sources in registration order.
    pub fn sources(&self) -> impl Iterator<Item = &FeedSource> {
        self.registry.iter()
    }

    /// Registers `item` under `tag`, replacing any source already using it.
    ///
    /// `order_column` overrides the feed's sort field for this source. An
    /// absent item (`None`) is ignored.
    pub fn add(
        &mut self,
        tag: impl Into<String>,
        item: impl IntoFeedItem,
        order_column: Option<&str>,
    ) -> &mut Self {
        let Some(item) = item.into_feed_item() else {
            return self;
        };

        let source = FeedSource::new(tag, item, order_column.map(str::to_string));
        debug!(feed = %self.id, tag = %source.tag, table = source.model().table(), "feed source registered");
        self.registry.insert(source);
        self.compiled.take();
        self
    }

    /// Like [`add`](Self::add), with the item produced by `supplier`.
    pub fn add_with<F, I>(&mut self, tag: impl Into<String>, supplier: F, order_column: Option<&str>) -> &mut Self
    where
        F: FnOnce() -> I,
        I: IntoFeedItem,
    {
        self.add(tag, supplier(), order_column)
    }

    /// Sets the default sort field and, if given, the direction.
    ///
    /// This does not reset a compiled query: a new sort field is picked up
    /// the next time a source is added. The direction applies to the next
    /// [`get`](Self::get) regardless.
    pub fn order_by(&mut self, field: impl Into<String>, direction: Option<SortDirection>) -> &mut Self {
        self.settings.sort_field = field.into();
        if let Some(direction) = direction {
            self.settings.sort_direction = direction;
        }
        self
    }

    /// Bounds the rows returned by [`get`](Self::get). An offset of `None` or
    /// `0` keeps any offset set earlier.
    pub fn limit(&mut self, count: u64, offset: Option<u64>) -> &mut Self {
        self.limit = Some(count);
        if let Some(offset) = offset.filter(|o| *o > 0) {
            self.offset = Some(offset);
        }
        self
    }

    /// `true` combines sources with `UNION`, `false` with `UNION ALL`.
    pub fn remove_duplicates(&mut self, enabled: bool) -> &mut Self {
        if self.settings.remove_duplicates != enabled {
            self.settings.remove_duplicates = enabled;
            self.compiled.take();
        }
        self
    }

    fn compiled(&self) -> EngineResult<&UnionQuery> {
        if let Some(query) = self.compiled.get() {
            return Ok(query);
        }
        let query = compiler::compile(&self.registry, &self.settings, self.store.driver_id())?;
        Ok(self.compiled.get_or_init(|| query))
    }

    fn page_query(&self, limit: Option<u64>, offset: Option<u64>) -> EngineResult<UnionQuery> {
        let mut page = self.compiled()?.clone();
        if let Some(limit) = limit {
            page = page.limit(limit);
        }
        if let Some(offset) = offset {
            page = page.offset(offset);
        }
        Ok(page.order_by(self.settings.sort_column.as_str(), self.settings.sort_direction))
    }

    /// The union query as SQL, without ordering or window.
    pub fn to_sql(&self) -> EngineResult<String> {
        Ok(self.compiled()?.to_sql(self.store.dialect()))
    }

    /// Parameters bound by the union query, grouped by clause.
    pub fn bindings(&self) -> EngineResult<Bindings> {
        Ok(self.compiled()?.bindings())
    }

    /// Total rows the feed produces, ignoring the window.
    #[instrument(skip(self), fields(feed = %self.id, sources = self.registry.len()))]
    pub async fn count(&self) -> EngineResult<u64> {
        let union = self.compiled()?.clone();
        executor::count(self.store.as_ref(), union).await
    }

    /// Runs the feed and returns full records in feed order.
    #[instrument(skip(self), fields(feed = %self.id, sources = self.registry.len()))]
    pub async fn get(&self) -> EngineResult<Vec<FeedRecord>> {
        let page = self.page_query(self.limit, self.offset)?;
        executor::materialize(self.store.as_ref(), &self.registry, &self.settings, &page).await
    }

    /// One 0-indexed page plus totals. The feed's own window is left alone.
    #[instrument(skip(self), fields(feed = %self.id))]
    pub async fn paginate(&self, page: u64, page_size: u64) -> EngineResult<FeedPage> {
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        let total_rows = self.count().await?;

        let offset = page.saturating_mul(page_size);
        let records = if offset >= total_rows {
            Vec::new()
        } else {
            let query = self.page_query(Some(page_size), Some(offset).filter(|o| *o > 0))?;
            executor::materialize(self.store.as_ref(), &self.registry, &self.settings, &query).await?
        };

        Ok(FeedPage {
            records,
            total_rows,
            page,
            page_size,
            total_pages: total_rows.div_ceil(page_size),
        })
    }
}
