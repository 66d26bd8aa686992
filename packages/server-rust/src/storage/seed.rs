//! Preloading collections from a JSON seed file.
//!
//! The seed is a single object mapping collection names to arrays of
//! documents: `{ "organizations": [{ "rowid": "o1", "name": "Phoenix" }] }`.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use serde_json::Value;
use tracing::info;

use super::record_store::RecordStore;

/// Inserts every document of a parsed seed. Returns the number inserted.
///
/// # Errors
///
/// Fails on the first document the store rejects.
pub async fn load_seed(
    store: &dyn RecordStore,
    seed: BTreeMap<String, Vec<Value>>,
) -> anyhow::Result<usize> {
    let mut inserted = 0;
    for (collection, docs) in seed {
        let count = docs.len();
        for doc in docs {
            store
                .insert(&collection, doc)
                .await
                .with_context(|| format!("seeding '{collection}'"))?;
        }
        info!(collection = %collection, count, "collection seeded");
        inserted += count;
    }
    Ok(inserted)
}

/// Reads and inserts a seed file.
///
/// # Errors
///
/// Fails when the file cannot be read, is not a collection map, or a
/// document is rejected.
pub async fn load_seed_file(store: &dyn RecordStore, path: &Path) -> anyhow::Result<usize> {
    let raw = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading seed file {}", path.display()))?;
    let seed: BTreeMap<String, Vec<Value>> = serde_json::from_slice(&raw)
        .with_context(|| format!("parsing seed file {}", path.display()))?;
    load_seed(store, seed).await
}
