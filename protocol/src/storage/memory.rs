//! # MemoryStore
//!
//! In-process backend. Each collection is its own `BTreeMap`, and a single
//! `RwLock` over the whole store makes `commit` atomic with respect to
//! readers: a reader sees the state before a commit or after it, never a
//! mix.

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;

use super::collection::{CollectionId, CollectionStore, StoreResult, WriteSet};
use super::history::TransactionRecord;

#[derive(Default)]
struct Inner {
    collections: HashMap<CollectionId, BTreeMap<String, Vec<u8>>>,
    history: Vec<TransactionRecord>,
}

/// A [`CollectionStore`] that lives entirely in memory.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys held in a collection.
    pub fn len(&self, collection: &CollectionId) -> usize {
        self.inner
            .read()
            .collections
            .get(collection)
            .map(|c| c.len())
            .unwrap_or(0)
    }
}

impl CollectionStore for MemoryStore {
    fn get(&self, collection: &CollectionId, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let inner = self.inner.read();
        Ok(inner
            .collections
            .get(collection)
            .and_then(|c| c.get(key))
            .cloned())
    }

    fn scan_prefix(
        &self,
        collection: &CollectionId,
        prefix: &str,
    ) -> StoreResult<Vec<(String, Vec<u8>)>> {
        let inner = self.inner.read();
        Ok(inner
            .collections
            .get(collection)
            .map(|c| {
                c.range(prefix.to_string()..)
                    .take_while(|(k, _)| k.starts_with(prefix))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn commit(&self, writes: WriteSet) -> StoreResult<()> {
        let (writes, record) = writes.into_parts();
        let mut inner = self.inner.write();
        for (collection, entries) in writes {
            let target = inner.collections.entry(collection).or_default();
            for (key, value) in entries {
                match value {
                    Some(bytes) => {
                        target.insert(key, bytes);
                    }
                    None => {
                        target.remove(&key);
                    }
                }
            }
        }
        if let Some(record) = record {
            inner.history.push(record);
        }
        Ok(())
    }

    fn history(&self) -> StoreResult<Vec<TransactionRecord>> {
        Ok(self.inner.read().history.clone())
    }
}
