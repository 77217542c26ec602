// SPDX-License-Identifier: Apache-2.0

//! Ordered tag → source registry

use crate::engine::error::{EngineError, EngineResult};

use super::types::FeedSource;

/// Sources in registration order. Tags are unique.
#[derive(Debug, Clone, Default)]
pub struct FeedRegistry {
    sources: Vec<FeedSource>,
}

impl FeedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `source`. An existing source with the same tag is replaced
    /// and keeps its position.
    pub fn insert(&mut self, source: FeedSource) {
        match self.sources.iter_mut().find(|s| s.tag == source.tag) {
            Some(slot) => *slot = source,
            None => self.sources.push(source),
        }
    }

    pub fn get(&self, tag: &str) -> Option<&FeedSource> {
        self.sources.iter().find(|s| s.tag == tag)
    }

    /// Like [`get`](Self::get), but an unknown tag is an error.
    pub fn require(&self, tag: &str) -> EngineResult<&FeedSource> {
        self.get(tag)
            .ok_or_else(|| EngineError::source_not_found(tag))
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeedSource> {
        self.sources.iter()
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|s| s.tag.as_str())
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
