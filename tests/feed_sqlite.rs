use std::sync::Arc;

use qorefeed::engine::{FeedStore, SqliteStore, StoreConfig};
use qorefeed::{DataFeed, EngineError, Model, Operator, SortDirection, Value};
use serde::Deserialize;

async fn seeded_store() -> Arc<SqliteStore> {
    let store = SqliteStore::connect(&StoreConfig::sqlite(":memory:"))
        .await
        .expect("in-memory sqlite should open");
    seed(&store).await;
    Arc::new(store)
}

async fn seed(store: &SqliteStore) {
    for statement in [
        "CREATE TABLE posts (id INTEGER PRIMARY KEY, title TEXT NOT NULL, published INTEGER NOT NULL, created_at TEXT NOT NULL)",
        "CREATE TABLE events (event_id INTEGER PRIMARY KEY, name TEXT NOT NULL, starts_at TEXT NOT NULL)",
        "CREATE TABLE logs (id INTEGER, message TEXT)",
        "INSERT INTO posts VALUES (1, 'Hello', 1, '2024-01-01'), (2, 'Draft', 0, '2024-01-05'), (3, 'Again', 1, '2024-01-09')",
        "INSERT INTO events VALUES (10, 'Meetup', '2024-01-03'), (20, 'Launch', '2024-01-07')",
        "INSERT INTO logs VALUES (1, 'dup'), (1, 'dup')",
    ] {
        sqlx::query(statement)
            .execute(store.pool())
            .await
            .unwrap_or_else(|e| panic!("seed failed on `{statement}`: {e}"));
    }
}

fn summary(records: &[qorefeed::FeedRecord], key: &str) -> Vec<(String, Value)> {
    records
        .iter()
        .map(|r| (r.tag.clone(), r.get(key).cloned().unwrap_or(Value::Null)))
        .collect()
}

fn posts_and_events(store: Arc<SqliteStore>) -> DataFeed {
    let mut feed = DataFeed::new(store);
    feed.add("post", Model::new("posts"), None)
        .add("event", Model::new("events").with_key("event_id"), Some("event_id"));
    feed
}

#[tokio::test]
async fn newest_three_across_posts_and_events() {
    let store = seeded_store().await;
    let mut feed = posts_and_events(store);
    feed.order_by("id", Some(SortDirection::Desc)).limit(3, None);

    let records = feed.get().await.unwrap();
    let tags: Vec<(&str, i64)> = records
        .iter()
        .map(|r| {
            let key = if r.tag == "post" { "id" } else { "event_id" };
            (r.tag.as_str(), r.get(key).and_then(Value::as_i64).unwrap())
        })
        .collect();
    assert_eq!(tags, vec![("event", 20), ("event", 10), ("post", 3)]);
}

#[tokio::test]
async fn records_come_from_the_source_registered_under_their_tag() {
    let store = seeded_store().await;
    let feed = posts_and_events(store);

    for record in feed.get().await.unwrap() {
        assert_eq!(record.get("tag_name"), Some(&Value::Text(record.tag.clone())));
        match record.tag.as_str() {
            "post" => assert!(record.get("title").is_some() && record.get("name").is_none()),
            "event" => assert!(record.get("name").is_some() && record.get("title").is_none()),
            other => panic!("unexpected tag {other}"),
        }
    }
}

#[tokio::test]
async fn count_matches_unbounded_get() {
    let store = seeded_store().await;
    let feed = posts_and_events(store);

    let records = feed.get().await.unwrap();
    assert_eq!(records.len(), 5);
    assert_eq!(feed.count().await.unwrap(), records.len() as u64);
}

#[tokio::test]
async fn per_source_sort_columns_interleave_by_date() {
    let store = seeded_store().await;
    let mut feed = DataFeed::new(store);
    feed.order_by("created_at", Some(SortDirection::Asc))
        .add("post", Model::new("posts"), None)
        .add("event", Model::new("events").with_key("event_id"), Some("starts_at"));

    let records = feed.get().await.unwrap();
    let order: Vec<String> = records
        .iter()
        .map(|r| {
            r.get("title")
                .or_else(|| r.get("name"))
                .and_then(Value::as_str)
                .unwrap()
                .to_string()
        })
        .collect();
    assert_eq!(order, vec!["Hello", "Meetup", "Draft", "Launch", "Again"]);
}

#[tokio::test]
async fn limit_and_offset_slice_the_feed() {
    let store = seeded_store().await;
    let mut feed = posts_and_events(store);
    feed.limit(2, Some(1));

    let records = feed.get().await.unwrap();
    assert_eq!(
        summary(&records, "tag_name"),
        vec![
            ("event".to_string(), Value::Text("event".into())),
            ("post".to_string(), Value::Text("post".into())),
        ]
    );
    assert_eq!(records[0].get("event_id"), Some(&Value::Int(10)));
    assert_eq!(records[1].get("id"), Some(&Value::Int(3)));
}

#[tokio::test]
async fn source_filters_are_kept_through_rehydration() {
    let store = seeded_store().await;
    let mut feed = DataFeed::new(store);
    feed.add(
        "post",
        Model::new("posts")
            .query()
            .where_eq("published", 1)
            .where_op("created_at", Operator::Gte, "2024-01-01"),
        None,
    );

    assert_eq!(feed.bindings().unwrap().len(), 2);
    assert_eq!(feed.count().await.unwrap(), 2);
    let ids: Vec<Value> = feed
        .get()
        .await
        .unwrap()
        .iter()
        .map(|r| r.get("id").cloned().unwrap())
        .collect();
    assert_eq!(ids, vec![Value::Int(3), Value::Int(1)]);
}

#[tokio::test]
async fn re_registering_a_tag_discards_its_old_rows() {
    let store = seeded_store().await;
    let mut feed = posts_and_events(store);
    assert_eq!(feed.count().await.unwrap(), 5);

    feed.add("post", Model::new("posts").query().where_eq("id", 2), None);
    assert_eq!(feed.count().await.unwrap(), 3);
    let posts: Vec<_> = feed
        .get()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.tag == "post")
        .collect();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].get("title"), Some(&Value::Text("Draft".into())));
}

#[tokio::test]
async fn duplicate_removal_collapses_identical_rows() {
    let store = seeded_store().await;
    let mut feed = DataFeed::new(store);
    feed.add("log", Model::new("logs"), None)
        .add("post", Model::new("posts").query().where_eq("id", 3), None);

    assert_eq!(feed.count().await.unwrap(), 3);
    assert_eq!(feed.get().await.unwrap().len(), 3);

    feed.remove_duplicates(true);
    assert_eq!(feed.count().await.unwrap(), 2);
    assert_eq!(
        summary(&feed.get().await.unwrap(), "id"),
        vec![
            ("post".to_string(), Value::Int(3)),
            ("log".to_string(), Value::Int(1)),
        ]
    );
}

#[tokio::test]
async fn records_decode_into_typed_structs() {
    #[derive(Debug, Deserialize)]
    struct Post {
        id: i64,
        title: String,
        tag_name: String,
    }

    let store = seeded_store().await;
    let mut feed = DataFeed::new(store);
    feed.add("post", Model::new("posts"), None).limit(1, None);

    let post: Post = feed.get().await.unwrap()[0].decode().unwrap();
    assert_eq!(post.id, 3);
    assert_eq!(post.title, "Again");
    assert_eq!(post.tag_name, "post");

    let err = feed.get().await.unwrap()[0].decode::<Vec<i64>>().unwrap_err();
    assert!(matches!(err, EngineError::Decode { .. }));
}

#[tokio::test]
async fn repeated_gets_reuse_the_compiled_sql() {
    let store = seeded_store().await;
    let mut feed = posts_and_events(store);
    feed.limit(2, None);

    let sql = feed.to_sql().unwrap();
    let first = summary(&feed.get().await.unwrap(), "tag_name");
    let second = summary(&feed.get().await.unwrap(), "tag_name");
    assert_eq!(first, second);
    assert_eq!(feed.to_sql().unwrap(), sql);
}

#[tokio::test]
async fn oversized_limit_returns_everything() {
    let store = seeded_store().await;
    let mut feed = posts_and_events(store);
    feed.limit(u64::MAX, Some(u64::MAX - 1));
    assert!(feed.get().await.unwrap().is_empty());

    let mut feed = posts_and_events(seeded_store().await);
    feed.limit(u64::MAX, None);
    assert_eq!(feed.get().await.unwrap().len(), 5);
}

#[tokio::test]
async fn paginate_walks_the_whole_feed() {
    let store = seeded_store().await;
    let feed = posts_and_events(store);

    let mut seen = 0;
    for page in 0..3 {
        let result = feed.paginate(page, 2).await.unwrap();
        assert_eq!(result.total_rows, 5);
        assert_eq!(result.total_pages, 3);
        seen += result.records.len();
    }
    assert_eq!(seen, 5);
    assert!(feed.paginate(3, 2).await.unwrap().records.is_empty());
}

#[tokio::test]
async fn empty_feed_fails_to_run() {
    let store = seeded_store().await;
    let feed = DataFeed::new(store);
    assert!(matches!(feed.get().await, Err(EngineError::EmptyFeed)));
    assert!(matches!(feed.count().await, Err(EngineError::EmptyFeed)));
}

#[tokio::test]
async fn file_backed_store_opens_from_url() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("feed.db");
    let store = qorefeed::connect_url(&format!("sqlite://{}", path.display()))
        .await
        .unwrap();
    assert_eq!(store.driver_id(), "sqlite");

    let sqlite = SqliteStore::connect(&StoreConfig::sqlite(path.display().to_string()))
        .await
        .unwrap();
    seed(&sqlite).await;
    sqlite.close().await;

    let mut feed = DataFeed::new(store);
    feed.add("event", Model::new("events").with_key("event_id"), Some("starts_at"));
    assert_eq!(feed.count().await.unwrap(), 2);
    let names: Vec<Value> = feed
        .get()
        .await
        .unwrap()
        .iter()
        .map(|r| r.get("name").cloned().unwrap())
        .collect();
    assert_eq!(names, vec![Value::Text("Launch".into()), Value::Text("Meetup".into())]);
}
