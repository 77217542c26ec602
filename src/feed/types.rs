// SPDX-License-Identifier: Apache-2.0

//! Feed data types
//!
//! Sources registered on a feed, the thin rows the union query returns and
//! the full records handed back to callers.

use std::fmt;

use qore_query::{Model, SelectQuery};
use serde::de::DeserializeOwned;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::types::{QueryResult, Row, Value};

/// Something that can be registered on a feed.
#[derive(Debug, Clone)]
pub enum FeedItem {
    /// A record type; every row of its table takes part.
    Model(Model),
    /// A filtered query over one record type.
    Query(SelectQuery),
}

impl FeedItem {
    pub fn into_query(self) -> SelectQuery {
        match self {
            FeedItem::Model(model) => model.query(),
            FeedItem::Query(query) => query,
        }
    }

    pub fn key_name(&self) -> &str {
        match self {
            FeedItem::Model(model) => model.key_name(),
            FeedItem::Query(query) => query.model().key_name(),
        }
    }
}

/// Conversion into an optional [`FeedItem`]. `None` means "nothing to add".
pub trait IntoFeedItem {
    fn into_feed_item(self) -> Option<FeedItem>;
}

impl IntoFeedItem for FeedItem {
    fn into_feed_item(self) -> Option<FeedItem> {
        Some(self)
    }
}

impl IntoFeedItem for Model {
    fn into_feed_item(self) -> Option<FeedItem> {
        Some(FeedItem::Model(self))
    }
}

impl IntoFeedItem for SelectQuery {
    fn into_feed_item(self) -> Option<FeedItem> {
        Some(FeedItem::Query(self))
    }
}

impl<T: IntoFeedItem> IntoFeedItem for Option<T> {
    fn into_feed_item(self) -> Option<FeedItem> {
        self.and_then(IntoFeedItem::into_feed_item)
    }
}

/// One registered source.
#[derive(Debug, Clone)]
pub struct FeedSource {
    pub tag: String,
    pub query: SelectQuery,
    pub key_column: String,
    /// Overrides the feed's sort field for this source only
    pub order_column: Option<String>,
}

impl FeedSource {
    pub fn new(tag: impl Into<String>, item: FeedItem, order_column: Option<String>) -> Self {
        let key_column = item.key_name().to_string();
        Self {
            tag: tag.into(),
            query: item.into_query(),
            key_column,
            order_column,
        }
    }

    pub fn model(&self) -> &Model {
        self.query.model()
    }

    /// Table-qualified key column.
    pub fn qualified_key(&self) -> String {
        self.model().qualify(&self.key_column)
    }

    /// Key column as it appears in a fetched row.
    pub fn key_field(&self) -> &str {
        self.key_column
            .rsplit('.')
            .next()
            .unwrap_or(&self.key_column)
    }
}

/// Canonical text form of a record key.
///
/// Keys come back from the union query and from the per-tag fetch through
/// different column types, so both sides are normalized before matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey(String);

impl RecordKey {
    pub fn from_value(value: &Value) -> Option<Self> {
        let text = match value {
            Value::Null => return None,
            Value::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) if f.fract() == 0.0 && f.is_finite() => (*f as i64).to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => s.clone(),
            Value::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
            Value::Json(j) => j.to_string(),
        };
        Some(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Thin row produced by the union query.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedRow {
    pub id: Value,
    pub tag: String,
    pub sort_value: Value,
}

impl FeedRow {
    /// Decodes every row of a union result using the synthetic column names.
    pub fn decode_all(
        result: &QueryResult,
        tag_column: &str,
        sort_column: &str,
    ) -> EngineResult<Vec<FeedRow>> {
        if result.rows.is_empty() {
            return Ok(Vec::new());
        }

        let column = |name: &str| {
            result.column_index(name).ok_or_else(|| {
                EngineError::decode(format!("Feed query result has no '{}' column", name))
            })
        };
        let id_idx = column("id")?;
        let tag_idx = column(tag_column)?;
        let sort_idx = column(sort_column)?;

        result
            .rows
            .iter()
            .map(|row| {
                let tag = match row.values.get(tag_idx) {
                    Some(Value::Text(tag)) => tag.clone(),
                    Some(Value::Bytes(bytes)) => String::from_utf8_lossy(bytes).into_owned(),
                    other => {
                        return Err(EngineError::decode(format!(
                            "Feed row has a non-text tag: {:?}",
                            other
                        )))
                    }
                };
                Ok(FeedRow {
                    id: row.values.get(id_idx).cloned().unwrap_or(Value::Null),
                    tag,
                    sort_value: row.values.get(sort_idx).cloned().unwrap_or(Value::Null),
                })
            })
            .collect()
    }

    pub fn key(&self) -> Option<RecordKey> {
        RecordKey::from_value(&self.id)
    }
}

/// A full record: column name to value, in result column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds one record per row of `result`.
    pub fn from_result(result: &QueryResult) -> Vec<Record> {
        result
            .rows
            .iter()
            .map(|row| Self::from_row(result, row))
            .collect()
    }

    fn from_row(result: &QueryResult, row: &Row) -> Record {
        let fields = result
            .columns
            .iter()
            .zip(row.values.iter())
            .map(|(column, value)| (column.name.clone(), value.clone()))
            .collect();
        Record { fields }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Sets `name`, replacing an existing field in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(field, _)| *field == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Decodes the record into any deserializable type.
    pub fn decode<T: DeserializeOwned>(&self) -> EngineResult<T> {
        let json = serde_json::to_value(self).map_err(|e| EngineError::decode(e.to_string()))?;
        serde_json::from_value(json).map_err(|e| EngineError::decode(e.to_string()))
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// A materialized record together with the tag of the source it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedRecord {
    pub tag: String,
    pub record: Record,
}

impl FeedRecord {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.record.get(name)
    }

    pub fn decode<T: DeserializeOwned>(&self) -> EngineResult<T> {
        self.record.decode()
    }
}

impl Serialize for FeedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.record.serialize(serializer)
    }
}

/// One page of a feed plus the totals needed to render pagination.
#[derive(Debug, Clone, Serialize)]
pub struct FeedPage {
    pub records: Vec<FeedRecord>,
    pub total_rows: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::ColumnInfo;
    use serde::Deserialize;

    fn result(columns: &[&str], rows: Vec<Vec<Value>>) -> QueryResult {
        QueryResult {
            columns: columns
                .iter()
                .map(|name| ColumnInfo {
                    name: name.to_string(),
                    data_type: "TEXT".into(),
                })
                .collect(),
            rows: rows.into_iter().map(|values| Row { values }).collect(),
            execution_time_ms: 0.0,
        }
    }

    #[test]
    fn none_items_are_skipped() {
        let missing: Option<Model> = None;
        assert!(missing.into_feed_item().is_none());
        assert!(Some(Model::new("posts")).into_feed_item().is_some());
    }

    #[test]
    fn source_takes_key_from_the_model() {
        let source = FeedSource::new(
            "event",
            Model::new("events").with_key("event_id").query().into_feed_item().unwrap(),
            None,
        );
        assert_eq!(source.key_column, "event_id");
        assert_eq!(source.qualified_key(), "events.event_id");
        assert_eq!(source.key_field(), "event_id");
    }

    #[test]
    fn record_keys_normalize_across_value_types() {
        assert_eq!(
            RecordKey::from_value(&Value::Int(7)),
            RecordKey::from_value(&Value::Text("7".into()))
        );
        assert_eq!(
            RecordKey::from_value(&Value::Float(7.0)),
            RecordKey::from_value(&Value::Int(7))
        );
        assert_eq!(RecordKey::from_value(&Value::Null), None);
    }

    #[test]
    fn decode_all_reads_synthetic_columns_by_name() {
        let rows = FeedRow::decode_all(
            &result(
                &["id", "tag_name", "order_by_column_name"],
                vec![vec![Value::Int(3), Value::Text("post".into()), Value::Int(3)]],
            ),
            "tag_name",
            "order_by_column_name",
        )
        .unwrap();
        assert_eq!(
            rows,
            vec![FeedRow {
                id: Value::Int(3),
                tag: "post".into(),
                sort_value: Value::Int(3),
            }]
        );
    }

    #[test]
    fn decode_all_rejects_missing_columns() {
        let err = FeedRow::decode_all(
            &result(&["id"], vec![vec![Value::Int(1)]]),
            "tag_name",
            "order_by_column_name",
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Decode { .. }));
    }

    #[test]
    fn record_serializes_flat_and_decodes_typed() {
        #[derive(Deserialize)]
        struct Post {
            id: i64,
            title: String,
            tag_name: String,
        }

        let mut record = Record::from_result(&result(
            &["id", "title"],
            vec![vec![Value::Int(1), Value::Text("Hello".into())]],
        ))
        .remove(0);
        record.set("tag_name", "post");

        assert_eq!(
            record.to_json(),
            serde_json::json!({"id": 1, "title": "Hello", "tag_name": "post"})
        );

        let post: Post = record.decode().unwrap();
        assert_eq!(post.id, 1);
        assert_eq!(post.title, "Hello");
        assert_eq!(post.tag_name, "post");
    }

    #[test]
    fn set_replaces_existing_field_in_place() {
        let mut record = Record::new();
        record.set("a", 1);
        record.set("b", 2);
        record.set("a", 3);
        let names: Vec<&str> = record.fields().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(record.get("a"), Some(&Value::Int(3)));
    }
}
