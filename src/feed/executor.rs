// SPDX-License-Identifier: Apache-2.0

//! Feed executor.
//!
//! Runs the thin union page, then rehydrates full records with one batched
//! `WHERE key IN (...)` fetch per tag and reassembles them in page order.

use std::collections::HashMap;
use std::time::Instant;

use qore_query::{CompiledSql, DerivedQuery, Expr, UnionQuery, Value};
use tracing::{debug, warn};

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::traits::FeedStore;
use crate::engine::types::QueryResult;
use crate::metrics::{self, FeedQueryKind};

use super::dialect;
use super::registry::FeedRegistry;
use super::settings::FeedSettings;
use super::types::{FeedRecord, FeedRow, Record, RecordKey};

/// Alias of the derived table the count query selects from.
pub const COUNT_ALIAS: &str = "records";
/// Alias of the count column.
pub const COUNT_COLUMN: &str = "total";

async fn fetch_tracked(
    store: &dyn FeedStore,
    kind: FeedQueryKind,
    query: &CompiledSql,
) -> EngineResult<QueryResult> {
    debug!(driver = store.driver_id(), kind = ?kind, sql = %query.sql, params = query.params.len(), "feed query");
    let start = Instant::now();
    let result = store.fetch(query).await;
    let elapsed_ms = start.elapsed().as_micros() as f64 / 1000.0;
    metrics::record_query(kind, elapsed_ms, result.is_ok());
    result
}

/// Ids of one tag, deduplicated, in first-seen order.
struct TagBatch {
    tag: String,
    keys: Vec<RecordKey>,
    ids: Vec<Value>,
}

/// Groups page rows by tag, tags and ids both in first-seen order.
fn group_by_tag(rows: &[FeedRow]) -> Vec<TagBatch> {
    let mut batches: Vec<TagBatch> = Vec::new();
    for row in rows {
        let Some(key) = row.key() else {
            continue;
        };
        let idx = match batches.iter().position(|b| b.tag == row.tag) {
            Some(idx) => idx,
            None => {
                batches.push(TagBatch {
                    tag: row.tag.clone(),
                    keys: Vec::new(),
                    ids: Vec::new(),
                });
                batches.len() - 1
            }
        };
        let batch = &mut batches[idx];
        if !batch.keys.contains(&key) {
            batch.keys.push(key);
            batch.ids.push(row.id.clone());
        }
    }
    batches
}

/// Runs an already windowed and ordered union page and materializes it.
pub async fn materialize(
    store: &dyn FeedStore,
    registry: &FeedRegistry,
    settings: &FeedSettings,
    page: &UnionQuery,
) -> EngineResult<Vec<FeedRecord>> {
    let compiled = page.compile(store.dialect());
    let result = fetch_tracked(store, FeedQueryKind::Page, &compiled).await?;
    let rows = FeedRow::decode_all(&result, &settings.tag_column, &settings.sort_column)?;
    let key_cast = result
        .column_index("id")
        .and_then(|idx| result.columns.get(idx))
        .and_then(|column| dialect::key_cast(store.driver_id(), &column.data_type));

    // tag -> key -> record
    let mut hydrated: HashMap<String, HashMap<RecordKey, Record>> = HashMap::new();
    for batch in group_by_tag(&rows) {
        let source = registry.require(&batch.tag)?;
        let query = source.query.clone();
        let query = match &key_cast {
            Some(sql_type) => query.where_in_as(source.qualified_key(), batch.ids, sql_type.as_str()),
            None => query.where_in(source.qualified_key(), batch.ids),
        };
        let fetch = query.compile(store.dialect());
        let result = fetch_tracked(store, FeedQueryKind::Hydrate, &fetch).await?;

        let mut by_key = HashMap::with_capacity(result.rows.len());
        if !result.rows.is_empty() {
            let key_field = source.key_field();
            if result.column_index(key_field).is_none() {
                return Err(EngineError::decode(format!(
                    "Records for tag '{}' do not include key column '{}'",
                    batch.tag, key_field
                )));
            }
            for record in Record::from_result(&result) {
                let key = record
                    .fields()
                    .find(|(name, _)| name.eq_ignore_ascii_case(key_field))
                    .and_then(|(_, value)| RecordKey::from_value(value));
                if let Some(key) = key {
                    by_key.entry(key).or_insert(record);
                }
            }
        }
        debug!(tag = %batch.tag, requested = batch.keys.len(), found = by_key.len(), "hydrated tag");
        hydrated.insert(batch.tag, by_key);
    }

    let mut records = Vec::with_capacity(rows.len());
    let mut skipped = 0u64;
    for row in &rows {
        let found = row
            .key()
            .and_then(|key| hydrated.get(&row.tag).and_then(|by_key| by_key.get(&key)));
        match found {
            Some(record) => {
                let mut record = record.clone();
                record.set(settings.tag_column.as_str(), row.tag.as_str());
                records.push(FeedRecord {
                    tag: row.tag.clone(),
                    record,
                });
            }
            None => {
                skipped += 1;
                warn!(tag = %row.tag, id = ?row.id, "feed record disappeared before it could be loaded; skipping");
            }
        }
    }
    if skipped > 0 {
        metrics::record_skipped(skipped);
    }

    Ok(records)
}

/// The counting wrapper around a compiled union.
pub fn count_query(union: UnionQuery) -> DerivedQuery {
    DerivedQuery::new(union, COUNT_ALIAS).select([Expr::raw("COUNT(*)").alias(COUNT_COLUMN)])
}

/// Number of rows the union produces, in one round trip.
pub async fn count(store: &dyn FeedStore, union: UnionQuery) -> EngineResult<u64> {
    let compiled = count_query(union).compile(store.dialect());
    let result = fetch_tracked(store, FeedQueryKind::Count, &compiled).await?;

    let idx = result.column_index(COUNT_COLUMN).unwrap_or(0);
    let total = result
        .rows
        .first()
        .and_then(|row| row.values.get(idx))
        .and_then(Value::as_i64)
        .ok_or_else(|| EngineError::decode("Count query returned no total"))?;

    u64::try_from(total).map_err(|_| EngineError::decode(format!("Negative row count: {}", total)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(tag: &str, id: i64) -> FeedRow {
        FeedRow {
            id: Value::Int(id),
            tag: tag.into(),
            sort_value: Value::Int(id),
        }
    }

    #[test]
    fn grouping_keeps_first_seen_order_and_drops_repeats() {
        let rows = vec![
            row("event", 20),
            row("post", 3),
            row("event", 10),
            row("event", 20),
            FeedRow {
                id: Value::Null,
                tag: "post".into(),
                sort_value: Value::Null,
            },
        ];
        let batches = group_by_tag(&rows);
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].tag, "event");
        assert_eq!(batches[0].ids, vec![Value::Int(20), Value::Int(10)]);
        assert_eq!(batches[1].tag, "post");
        assert_eq!(batches[1].ids, vec![Value::Int(3)]);
    }
}
