//! Document record store trait.
//!
//! Defines [`RecordStore`], the interface every console service uses to read
//! and write JSON documents grouped into named collections. Documents carry a
//! string `_id`. Single-document updates are atomic; nothing else is.

use async_trait::async_trait;
use catalyst_core::query::{Predicate, QueryDescriptor};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Field holding a document's identifier.
pub const ID_FIELD: &str = "_id";

/// Mutation applied to one document while the store holds it exclusively.
///
/// An error leaves the stored document untouched.
pub type DocumentMutation = Box<dyn FnOnce(&mut Value) -> anyhow::Result<()> + Send>;

/// Collection-oriented document store.
///
/// Implementations: in-memory ([`MemoryRecordStore`](super::engines::MemoryRecordStore)).
/// A database-backed implementation plugs in behind the same trait.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Inserts a document, assigning `_id` when absent. Returns the id.
    async fn insert(&self, collection: &str, doc: Value) -> anyhow::Result<String>;

    /// Fetches a document by id.
    async fn get(&self, collection: &str, id: &str) -> anyhow::Result<Option<Value>>;

    /// All documents matching the predicate, in natural (insertion) order.
    async fn find(&self, collection: &str, predicate: &Predicate) -> anyhow::Result<Vec<Value>>;

    /// Number of documents matching the predicate.
    async fn count(&self, collection: &str, predicate: &Predicate) -> anyhow::Result<u64>;

    /// One sorted, windowed page of the documents matching the query predicate.
    async fn find_page(
        &self,
        collection: &str,
        query: &QueryDescriptor,
    ) -> anyhow::Result<Vec<Value>>;

    /// Atomically mutates one document. Returns the updated document, or
    /// `None` when the id is absent.
    async fn modify(
        &self,
        collection: &str,
        id: &str,
        mutation: DocumentMutation,
    ) -> anyhow::Result<Option<Value>>;

    /// Sets every (possibly dotted) key of `patch` on each matching document.
    /// Returns the number of documents updated.
    async fn update_many(
        &self,
        collection: &str,
        predicate: &Predicate,
        patch: Map<String, Value>,
    ) -> anyhow::Result<u64>;

    /// Removes a document. Returns whether it existed.
    async fn delete(&self, collection: &str, id: &str) -> anyhow::Result<bool>;

    /// First document matching the predicate.
    async fn find_one(
        &self,
        collection: &str,
        predicate: &Predicate,
    ) -> anyhow::Result<Option<Value>> {
        Ok(self.find(collection, predicate).await?.into_iter().next())
    }

    /// Sets every (possibly dotted) key of `patch` on one document.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Map<String, Value>,
    ) -> anyhow::Result<Option<Value>> {
        self.modify(
            collection,
            id,
            Box::new(move |doc| {
                apply_patch(doc, &patch);
                Ok(())
            }),
        )
        .await
    }
}

/// Sets `value` at a dotted path, creating intermediate objects.
pub fn set_path(doc: &mut Value, path: &str, value: Value) {
    let mut current = doc;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let Value::Object(map) = current else {
            return;
        };
        if segments.peek().is_none() {
            map.insert(segment.to_string(), value);
            return;
        }
        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
}

/// Applies each `(path, value)` of a patch with [`set_path`].
pub fn apply_patch(doc: &mut Value, patch: &Map<String, Value>) {
    for (path, value) in patch {
        if path != ID_FIELD {
            set_path(doc, path, value.clone());
        }
    }
}

/// Fetches a document by id and decodes it.
///
/// # Errors
///
/// Propagates store failures and decoding errors.
pub async fn load<T: DeserializeOwned>(
    store: &dyn RecordStore,
    collection: &str,
    id: &str,
) -> anyhow::Result<Option<T>> {
    store
        .get(collection, id)
        .await?
        .map(|doc| decode(collection, doc))
        .transpose()
}

/// Finds matching documents and decodes each one.
///
/// # Errors
///
/// Propagates store failures and decoding errors.
pub async fn find_as<T: DeserializeOwned>(
    store: &dyn RecordStore,
    collection: &str,
    predicate: &Predicate,
) -> anyhow::Result<Vec<T>> {
    store
        .find(collection, predicate)
        .await?
        .into_iter()
        .map(|doc| decode(collection, doc))
        .collect()
}

/// Finds the first matching document and decodes it.
///
/// # Errors
///
/// Propagates store failures and decoding errors.
pub async fn find_one_as<T: DeserializeOwned>(
    store: &dyn RecordStore,
    collection: &str,
    predicate: &Predicate,
) -> anyhow::Result<Option<T>> {
    store
        .find_one(collection, predicate)
        .await?
        .map(|doc| decode(collection, doc))
        .transpose()
}

fn decode<T: DeserializeOwned>(collection: &str, doc: Value) -> anyhow::Result<T> {
    serde_json::from_value(doc)
        .map_err(|e| anyhow::anyhow!("malformed document in '{collection}': {e}"))
}
