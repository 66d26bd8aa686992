//! In-memory [`RecordStore`] implementation backed by [`DashMap`].
//!
//! One `DashMap` per collection, keyed by `_id`. Every document remembers the
//! sequence number it was inserted with so snapshots come back in natural
//! (insertion) order, which the query pipeline uses to break sort ties.

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::bail;
use async_trait::async_trait;
use catalyst_core::query::{Predicate, QueryDescriptor};
use dashmap::DashMap;
use serde_json::{Map, Value};
use tracing::trace;

use crate::storage::record_store::{apply_patch, DocumentMutation, RecordStore, ID_FIELD};

#[derive(Debug, Clone)]
struct StoredDocument {
    seq: u64,
    doc: Value,
}

/// Concurrent in-memory document store.
///
/// Writers to the same document serialize on its shard lock; `modify` holds
/// that lock while the mutation runs, which makes single-document updates
/// atomic.
pub struct MemoryRecordStore {
    collections: DashMap<String, DashMap<String, StoredDocument>>,
    next_seq: AtomicU64,
}

impl MemoryRecordStore {
    /// Creates a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            collections: DashMap::new(),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Number of documents in a collection.
    #[must_use]
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .get(collection)
            .map_or(0, |docs| docs.len())
    }

    /// Returns `true` if the collection holds no documents.
    #[must_use]
    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    /// Matching documents cloned out in insertion order.
    fn snapshot(&self, collection: &str, predicate: &Predicate) -> Vec<Value> {
        let Some(docs) = self.collections.get(collection) else {
            return Vec::new();
        };
        let mut matched: Vec<StoredDocument> = docs
            .iter()
            .filter(|entry| predicate.matches(&entry.value().doc))
            .map(|entry| entry.value().clone())
            .collect();
        matched.sort_by_key(|stored| stored.seq);
        matched.into_iter().map(|stored| stored.doc).collect()
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert(&self, collection: &str, mut doc: Value) -> anyhow::Result<String> {
        let Value::Object(fields) = &mut doc else {
            bail!("documents in '{collection}' must be JSON objects");
        };
        let id = match fields.get(ID_FIELD) {
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            Some(Value::String(_)) | None => {
                let id = uuid::Uuid::new_v4().simple().to_string();
                fields.insert(ID_FIELD.to_string(), Value::String(id.clone()));
                id
            }
            Some(other) => bail!("'{ID_FIELD}' must be a string, got {other}"),
        };

        let docs = self.collections.entry(collection.to_string()).or_default();
        if docs.contains_key(&id) {
            bail!("duplicate {ID_FIELD} '{id}' in '{collection}'");
        }
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        docs.insert(id.clone(), StoredDocument { seq, doc });
        trace!(collection, id = %id, "document inserted");
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> anyhow::Result<Option<Value>> {
        Ok(self
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id).map(|stored| stored.doc.clone())))
    }

    async fn find(&self, collection: &str, predicate: &Predicate) -> anyhow::Result<Vec<Value>> {
        Ok(self.snapshot(collection, predicate))
    }

    async fn count(&self, collection: &str, predicate: &Predicate) -> anyhow::Result<u64> {
        let Some(docs) = self.collections.get(collection) else {
            return Ok(0);
        };
        let matched = docs
            .iter()
            .filter(|entry| predicate.matches(&entry.value().doc))
            .count();
        Ok(u64::try_from(matched).unwrap_or(u64::MAX))
    }

    async fn find_page(
        &self,
        collection: &str,
        query: &QueryDescriptor,
    ) -> anyhow::Result<Vec<Value>> {
        Ok(query.sort_and_page(self.snapshot(collection, &query.predicate)))
    }

    async fn modify(
        &self,
        collection: &str,
        id: &str,
        mutation: DocumentMutation,
    ) -> anyhow::Result<Option<Value>> {
        let Some(docs) = self.collections.get(collection) else {
            return Ok(None);
        };
        let Some(mut stored) = docs.get_mut(id) else {
            return Ok(None);
        };

        let mut updated = stored.doc.clone();
        mutation(&mut updated)?;
        if let Value::Object(fields) = &mut updated {
            fields.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
        }
        stored.doc = updated.clone();
        Ok(Some(updated))
    }

    async fn update_many(
        &self,
        collection: &str,
        predicate: &Predicate,
        patch: Map<String, Value>,
    ) -> anyhow::Result<u64> {
        let Some(docs) = self.collections.get(collection) else {
            return Ok(0);
        };
        let mut updated = 0;
        for mut entry in docs.iter_mut() {
            if predicate.matches(&entry.doc) {
                apply_patch(&mut entry.doc, &patch);
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn delete(&self, collection: &str, id: &str) -> anyhow::Result<bool> {
        Ok(self
            .collections
            .get(collection)
            .is_some_and(|docs| docs.remove(id).is_some()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalyst_core::query::{resources, ListRequest, RawListRequest};
    use serde_json::json;

    #[tokio::test]
    async fn insert_assigns_ids_and_get_round_trips() {
        let store = MemoryRecordStore::new();
        let id = store
            .insert("services", json!({ "name": "web" }))
            .await
            .unwrap();
        assert_eq!(id.len(), 32);

        let doc = store.get("services", &id).await.unwrap().unwrap();
        assert_eq!(doc["_id"], json!(id));
        assert_eq!(doc["name"], "web");
        assert!(store.get("services", "nope").await.unwrap().is_none());
        assert!(store.get("missing", &id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn insert_keeps_given_id_and_rejects_duplicates() {
        let store = MemoryRecordStore::new();
        store.insert("gitHub", json!({ "_id": "g1" })).await.unwrap();
        assert!(store.insert("gitHub", json!({ "_id": "g1" })).await.is_err());
        assert!(store.insert("gitHub", json!(["not", "an", "object"])).await.is_err());
        assert_eq!(store.len("gitHub"), 1);
    }

    #[tokio::test]
    async fn find_returns_natural_order() {
        let store = MemoryRecordStore::new();
        for name in ["c", "a", "b"] {
            store
                .insert("projects", json!({ "_id": name, "rowid": name }))
                .await
                .unwrap();
        }
        let ids: Vec<_> = store
            .find("projects", &Predicate::all())
            .await
            .unwrap()
            .into_iter()
            .map(|d| d["_id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, ["c", "a", "b"]);
    }

    #[tokio::test]
    async fn count_and_page_share_the_predicate() {
        let store = MemoryRecordStore::new();
        for i in 0..48 {
            store
                .insert(
                    "unmanagedInstances",
                    json!({
                        "providerId": if i < 40 { "p1" } else { "p2" },
                        "platformId": format!("i-{i:03}"),
                        "state": "running",
                    }),
                )
                .await
                .unwrap();
        }
        let schema = resources::UNMANAGED_INSTANCES;
        let raw = RawListRequest {
            page_size: Some("5".into()),
            sort_by: Some("platformId".into()),
            sort_order: Some("asc".into()),
            ..RawListRequest::default()
        };
        let request = ListRequest::normalize(&raw, &schema).unwrap();
        let query = QueryDescriptor::build(&request, &schema, Predicate::eq("providerId", "p1"));

        assert_eq!(store.count(schema.collection, &query.predicate).await.unwrap(), 40);
        let page = store.find_page(schema.collection, &query).await.unwrap();
        assert_eq!(page.len(), 5);
        assert_eq!(page[0]["platformId"], "i-000");
    }

    #[tokio::test]
    async fn modify_is_all_or_nothing() {
        let store = MemoryRecordStore::new();
        store
            .insert("services", json!({ "_id": "s1", "state": "Initializing" }))
            .await
            .unwrap();

        let failed = store
            .modify(
                "services",
                "s1",
                Box::new(|doc| {
                    doc["state"] = json!("half-written");
                    anyhow::bail!("boom")
                }),
            )
            .await;
        assert!(failed.is_err());
        assert_eq!(
            store.get("services", "s1").await.unwrap().unwrap()["state"],
            "Initializing"
        );

        let updated = store
            .modify(
                "services",
                "s1",
                Box::new(|doc| {
                    doc["state"] = json!("Authentication_Error");
                    doc["_id"] = json!("hijacked");
                    Ok(())
                }),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated["state"], "Authentication_Error");
        assert_eq!(updated["_id"], "s1");
        assert!(store
            .modify("services", "missing", Box::new(|_| Ok(())))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn update_sets_dotted_paths() {
        let store = MemoryRecordStore::new();
        store
            .insert("resources", json!({ "_id": "r1", "resourceDetails": { "os": "linux" } }))
            .await
            .unwrap();
        let patch = json!({ "resourceDetails.bootStrapState": "success", "authentication": "success" });
        let doc = store
            .update("resources", "r1", patch.as_object().unwrap().clone())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["resourceDetails"], json!({ "os": "linux", "bootStrapState": "success" }));
        assert_eq!(doc["authentication"], "success");
    }

    #[tokio::test]
    async fn update_many_and_delete() {
        let store = MemoryRecordStore::new();
        for (id, name) in [("s1", "web"), ("s2", "web"), ("s3", "db")] {
            store
                .insert("services", json!({ "_id": id, "name": name, "isDeleted": false }))
                .await
                .unwrap();
        }
        let patch = json!({ "isDeleted": true });
        let updated = store
            .update_many(
                "services",
                &Predicate::eq("name", "web"),
                patch.as_object().unwrap().clone(),
            )
            .await
            .unwrap();
        assert_eq!(updated, 2);
        assert_eq!(
            store.count("services", &Predicate::eq("isDeleted", true)).await.unwrap(),
            2
        );

        assert!(store.delete("services", "s3").await.unwrap());
        assert!(!store.delete("services", "s3").await.unwrap());
        assert!(!store.delete("nothing", "s3").await.unwrap());
        assert_eq!(store.len("services"), 2);
    }

    #[tokio::test]
    async fn find_one_takes_the_first_match() {
        let store = MemoryRecordStore::new();
        store
            .insert("organizations", json!({ "rowid": "o1", "name": "Phoenix" }))
            .await
            .unwrap();
        store
            .insert("organizations", json!({ "rowid": "o1", "name": "Shadow" }))
            .await
            .unwrap();
        let org = store
            .find_one("organizations", &Predicate::eq("rowid", "o1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(org["name"], "Phoenix");
        assert!(store.is_empty("projects"));
    }
}
