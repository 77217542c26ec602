//! Lightweight in-memory feed metrics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

use serde::Serialize;

/// What a store round trip was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedQueryKind {
    /// The windowed union query behind `get()`
    Page,
    /// One batched per-tag fetch during materialization
    Hydrate,
    /// The wrapping `COUNT(*)` query
    Count,
}

#[derive(Default)]
struct FeedMetrics {
    page_queries: AtomicU64,
    hydrate_queries: AtomicU64,
    count_queries: AtomicU64,
    failed: AtomicU64,
    skipped_records: AtomicU64,
    duration_total_ms: AtomicU64,
    duration_max_ms: AtomicU64,
}

static FEED_METRICS: OnceLock<FeedMetrics> = OnceLock::new();

fn metrics() -> &'static FeedMetrics {
    FEED_METRICS.get_or_init(FeedMetrics::default)
}

pub fn record_query(kind: FeedQueryKind, duration_ms: f64, success: bool) {
    let duration_ms = duration_ms.max(0.0) as u64;
    let metrics = metrics();
    let counter = match kind {
        FeedQueryKind::Page => &metrics.page_queries,
        FeedQueryKind::Hydrate => &metrics.hydrate_queries,
        FeedQueryKind::Count => &metrics.count_queries,
    };
    counter.fetch_add(1, Ordering::Relaxed);
    if !success {
        metrics.failed.fetch_add(1, Ordering::Relaxed);
    }
    metrics
        .duration_total_ms
        .fetch_add(duration_ms, Ordering::Relaxed);

    let mut current = metrics.duration_max_ms.load(Ordering::Relaxed);
    while duration_ms > current {
        match metrics.duration_max_ms.compare_exchange(
            current,
            duration_ms,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(next) => current = next,
        }
    }
}

/// A union row whose record was gone by the time it was fetched.
pub fn record_skipped(count: u64) {
    metrics().skipped_records.fetch_add(count, Ordering::Relaxed);
}

#[derive(Debug, Serialize)]
pub struct FeedMetricsSnapshot {
    pub page_queries: u64,
    pub hydrate_queries: u64,
    pub count_queries: u64,
    pub failed: u64,
    pub skipped_records: u64,
    pub avg_ms: Option<f64>,
    pub max_ms: Option<u64>,
}

impl FeedMetricsSnapshot {
    pub fn total_queries(&self) -> u64 {
        self.page_queries + self.hydrate_queries + self.count_queries
    }
}

pub fn snapshot() -> FeedMetricsSnapshot {
    let metrics = metrics();
    let page_queries = metrics.page_queries.load(Ordering::Relaxed);
    let hydrate_queries = metrics.hydrate_queries.load(Ordering::Relaxed);
    let count_queries = metrics.count_queries.load(Ordering::Relaxed);
    let duration_total = metrics.duration_total_ms.load(Ordering::Relaxed);
    let max_ms = metrics.duration_max_ms.load(Ordering::Relaxed);

    let total = page_queries + hydrate_queries + count_queries;
    let avg_ms = if total > 0 {
        Some(duration_total as f64 / total as f64)
    } else {
        None
    };

    FeedMetricsSnapshot {
        page_queries,
        hydrate_queries,
        count_queries,
        failed: metrics.failed.load(Ordering::Relaxed),
        skipped_records: metrics.skipped_records.load(Ordering::Relaxed),
        avg_ms,
        max_ms: if max_ms > 0 { Some(max_ms) } else { None },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_flow() {
        // Other tests record concurrently, so only compare lower bounds
        let initial = snapshot();

        record_query(FeedQueryKind::Page, 100.0, true);
        let s1 = snapshot();
        assert!(s1.page_queries >= initial.page_queries + 1);
        assert!(s1.total_queries() >= initial.total_queries() + 1);

        record_query(FeedQueryKind::Hydrate, 50.0, false);
        let s2 = snapshot();
        assert!(s2.hydrate_queries >= s1.hydrate_queries + 1);
        assert!(s2.failed >= s1.failed + 1);

        record_query(FeedQueryKind::Count, 1.0, true);
        assert!(snapshot().count_queries >= s2.count_queries + 1);

        record_skipped(2);
        assert!(snapshot().skipped_records >= initial.skipped_records + 2);

        record_query(FeedQueryKind::Page, 99999.0, true);
        assert!(snapshot().max_ms.unwrap() >= 99999);
    }
}
