//! In-process document store with realtime subscriptions.
//!
//! Backs offline sessions and the test suite. Server timestamps are a
//! strictly monotonic millisecond clock, so timestamp-ordered queries give a
//! stable total order even when writes land within the same millisecond.

use super::types::{
    is_server_timestamp, ArrayOp, Direction, DocEvent, DocumentSnapshot, Query, StoreError,
};
use super::{DocumentStore, Subscription};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::mpsc;

struct Watcher {
    query: Query,
    tx: mpsc::UnboundedSender<Result<DocEvent, StoreError>>,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<String, BTreeMap<String, Value>>,
    watchers: Vec<Watcher>,
    last_timestamp: i64,
    next_id: u64,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock only means another thread panicked mid-write;
        // the map itself is still usable.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn split_path(path: &str) -> Result<(&str, &str), StoreError> {
        path.rsplit_once('/')
            .filter(|(collection, id)| !collection.is_empty() && !id.is_empty())
            .ok_or_else(|| StoreError::InvalidPath(path.to_string()))
    }

    fn next_timestamp(inner: &mut Inner) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        let ts = now.max(inner.last_timestamp + 1);
        inner.last_timestamp = ts;
        ts
    }

    fn resolve_sentinels(inner: &mut Inner, fields: &mut Value) {
        if let Some(map) = fields.as_object_mut() {
            for value in map.values_mut() {
                if is_server_timestamp(value) {
                    *value = Value::from(Self::next_timestamp(inner));
                }
            }
        }
    }

    fn notify(inner: &mut Inner, collection: &str, id: &str, before: Option<&Value>, after: Option<&Value>) {
        inner.watchers.retain(|watcher| {
            if watcher.query.collection != collection {
                return !watcher.tx.is_closed();
            }
            let matched_before = before.is_some_and(|fields| watcher.query.matches(fields));
            let matched_after = after.is_some_and(|fields| watcher.query.matches(fields));
            let event = if matched_after && (!matched_before || before != after) {
                Some(DocEvent::Added(DocumentSnapshot::new(
                    id,
                    after.cloned().unwrap_or(Value::Null),
                )))
            } else if matched_before && !matched_after {
                Some(DocEvent::Removed { id: id.to_string() })
            } else {
                None
            };
            match event {
                Some(event) => watcher.tx.send(Ok(event)).is_ok(),
                None => !watcher.tx.is_closed(),
            }
        });
    }

    fn query_snapshot(inner: &Inner, query: &Query) -> Vec<DocumentSnapshot> {
        let mut results: Vec<DocumentSnapshot> = inner
            .collections
            .get(&query.collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, fields)| query.matches(fields))
                    .map(|(id, fields)| DocumentSnapshot::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = &query.order_by {
            results.sort_by(|a, b| {
                let ord = compare_field(a.fields.get(&order.field), b.fields.get(&order.field));
                match order.direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            });
        }
        if let Some(limit) = query.limit {
            results.truncate(limit);
        }
        results
    }
}

fn compare_field(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => a.to_string().cmp(&b.to_string()),
        },
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn read_one(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let (collection, id) = Self::split_path(path)?;
        let inner = self.lock();
        Ok(inner
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn run_query(&self, query: &Query) -> Result<Vec<DocumentSnapshot>, StoreError> {
        let inner = self.lock();
        Ok(Self::query_snapshot(&inner, query))
    }

    async fn create(&self, collection: &str, mut fields: Value) -> Result<String, StoreError> {
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = format!("doc{:06}", inner.next_id);
        Self::resolve_sentinels(&mut inner, &mut fields);
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields.clone());
        Self::notify(&mut inner, collection, &id, None, Some(&fields));
        Ok(id)
    }

    async fn merge_write(&self, path: &str, mut fields: Value) -> Result<(), StoreError> {
        let (collection, id) = Self::split_path(path)?;
        let mut inner = self.lock();
        Self::resolve_sentinels(&mut inner, &mut fields);

        let docs = inner.collections.entry(collection.to_string()).or_default();
        let before = docs.get(id).cloned();
        let mut merged = before.clone().unwrap_or_else(|| Value::Object(Default::default()));
        if let (Some(target), Some(incoming)) = (merged.as_object_mut(), fields.as_object()) {
            for (key, value) in incoming {
                target.insert(key.clone(), value.clone());
            }
        } else {
            merged = fields;
        }
        docs.insert(id.to_string(), merged.clone());
        Self::notify(&mut inner, collection, id, before.as_ref(), Some(&merged));
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        let (collection, id) = Self::split_path(path)?;
        let mut inner = self.lock();
        let before = inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id));
        if let Some(before) = before {
            Self::notify(&mut inner, collection, id, Some(&before), None);
        }
        Ok(())
    }

    async fn update_array(
        &self,
        path: &str,
        field: &str,
        op: ArrayOp,
        value: Value,
    ) -> Result<(), StoreError> {
        let (collection, id) = Self::split_path(path)?;
        let mut inner = self.lock();
        let before = inner
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned()
            .ok_or_else(|| StoreError::Backend(format!("no document to update: {path}")))?;

        let mut after = before.clone();
        let entry = after
            .as_object_mut()
            .ok_or_else(|| StoreError::Decode(format!("{path} is not an object")))?
            .entry(field.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        let items = entry
            .as_array_mut()
            .ok_or_else(|| StoreError::Decode(format!("{path}.{field} is not an array")))?;
        match op {
            ArrayOp::Union => {
                if !items.contains(&value) {
                    items.push(value);
                }
            }
            ArrayOp::Remove => items.retain(|item| item != &value),
        }

        if let Some(docs) = inner.collections.get_mut(collection) {
            docs.insert(id.to_string(), after.clone());
        }
        Self::notify(&mut inner, collection, id, Some(&before), Some(&after));
        Ok(())
    }

    async fn subscribe(&self, query: &Query) -> Result<Subscription, StoreError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.lock();
        for snapshot in Self::query_snapshot(&inner, query) {
            // Receiver was just created; a send failure is unreachable.
            let _ = tx.send(Ok(DocEvent::Added(snapshot)));
        }
        inner.watchers.push(Watcher {
            query: query.clone(),
            tx,
        });
        Ok(Subscription { events: rx })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::server_timestamp;
    use serde_json::json;

    fn msg(conversation: &str, body: &str) -> Value {
        json!({
            "conversationId": conversation,
            "body": body,
            "createdAt": server_timestamp(),
        })
    }

    #[tokio::test]
    async fn create_assigns_monotonic_timestamps() {
        let store = MemoryStore::new();
        store.create("public/messages", msg("c", "one")).await.unwrap();
        store.create("public/messages", msg("c", "two")).await.unwrap();

        let query = Query::collection("public/messages")
            .where_eq("conversationId", json!("c"))
            .order_by_asc("createdAt");
        let docs = store.run_query(&query).await.unwrap();
        assert_eq!(docs.len(), 2);
        let first = docs[0].fields["createdAt"].as_i64().unwrap();
        let second = docs[1].fields["createdAt"].as_i64().unwrap();
        assert!(first < second);
        assert_eq!(docs[0].fields["body"], "one");
    }

    #[tokio::test]
    async fn subscribe_replays_snapshot_then_pushes_live_changes() {
        let store = MemoryStore::new();
        store.create("public/messages", msg("c", "old")).await.unwrap();

        let query = Query::collection("public/messages")
            .where_eq("conversationId", json!("c"))
            .order_by_asc("createdAt");
        let mut sub = store.subscribe(&query).await.unwrap();

        let Ok(DocEvent::Added(snapshot)) = sub.events.recv().await.unwrap() else {
            panic!("expected initial snapshot");
        };
        assert_eq!(snapshot.fields["body"], "old");

        let id = store.create("public/messages", msg("c", "new")).await.unwrap();
        let Ok(DocEvent::Added(snapshot)) = sub.events.recv().await.unwrap() else {
            panic!("expected live added event");
        };
        assert_eq!(snapshot.id, id);

        store
            .delete(&format!("public/messages/{id}"))
            .await
            .unwrap();
        let Ok(DocEvent::Removed { id: removed }) = sub.events.recv().await.unwrap() else {
            panic!("expected removed event");
        };
        assert_eq!(removed, id);
    }

    #[tokio::test]
    async fn subscribe_ignores_documents_outside_the_query() {
        let store = MemoryStore::new();
        let query = Query::collection("public/messages").where_eq("conversationId", json!("a"));
        let mut sub = store.subscribe(&query).await.unwrap();

        store.create("public/messages", msg("b", "other")).await.unwrap();
        store.create("public/messages", msg("a", "mine")).await.unwrap();

        let Ok(DocEvent::Added(snapshot)) = sub.events.recv().await.unwrap() else {
            panic!("expected added event");
        };
        assert_eq!(snapshot.fields["body"], "mine");
    }

    #[tokio::test]
    async fn update_array_union_is_idempotent_and_remove_deletes() {
        let store = MemoryStore::new();
        store
            .merge_write("public/radio_channels/99.9", json!({ "admins": ["a"] }))
            .await
            .unwrap();
        store
            .update_array("public/radio_channels/99.9", "admins", ArrayOp::Union, json!("b"))
            .await
            .unwrap();
        store
            .update_array("public/radio_channels/99.9", "admins", ArrayOp::Union, json!("b"))
            .await
            .unwrap();

        let doc = store
            .read_one("public/radio_channels/99.9")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["admins"], json!(["a", "b"]));

        store
            .update_array("public/radio_channels/99.9", "admins", ArrayOp::Remove, json!("a"))
            .await
            .unwrap();
        let doc = store
            .read_one("public/radio_channels/99.9")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["admins"], json!(["b"]));
    }

    #[tokio::test]
    async fn update_array_on_missing_document_fails() {
        let store = MemoryStore::new();
        let err = store
            .update_array("public/radio_channels/1.0", "admins", ArrayOp::Union, json!("a"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[tokio::test]
    async fn merge_write_updates_are_pushed_to_document_watchers() {
        let store = MemoryStore::new();
        store
            .merge_write("public/radio_channels/88.0", json!({ "admins": [] }))
            .await
            .unwrap();

        let query = Query::collection("public/radio_channels");
        let mut sub = store.subscribe(&query).await.unwrap();
        sub.events.recv().await.unwrap().unwrap(); // initial snapshot

        store
            .merge_write("public/radio_channels/88.0", json!({ "admins": ["a"] }))
            .await
            .unwrap();
        let Ok(DocEvent::Added(snapshot)) = sub.events.recv().await.unwrap() else {
            panic!("expected change event");
        };
        assert_eq!(snapshot.fields["admins"], json!(["a"]));
    }

    #[tokio::test]
    async fn descending_order_with_limit_returns_latest() {
        let store = MemoryStore::new();
        for i in 0..3 {
            store
                .create("users/u1/notifications", json!({ "n": i, "createdAt": server_timestamp() }))
                .await
                .unwrap();
        }
        let query = Query::collection("users/u1/notifications")
            .order_by_desc("createdAt")
            .limit(1);
        let docs = store.run_query(&query).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].fields["n"], json!(2));
    }
}
