//! # Collections and Write Sets
//!
//! A collection is an access-partitioned keyspace. There is exactly one
//! shared collection and one private collection per organization.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::history::TransactionRecord;
use crate::config::SHARED_COLLECTION_NAME;
use crate::identity::OrgId;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors that can occur inside a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("corrupt key in collection {collection}")]
    CorruptKey { collection: String },

    #[error("transaction aborted")]
    Aborted,
}

pub type StoreResult<T> = Result<T, StoreError>;

// ---------------------------------------------------------------------------
// CollectionId
// ---------------------------------------------------------------------------

/// Identifies one partition of the ledger.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CollectionId {
    /// The collection every participant can read.
    Shared,
    /// The private collection of a single organization.
    Private(OrgId),
}

impl CollectionId {
    pub fn private(org: &OrgId) -> Self {
        CollectionId::Private(org.clone())
    }

    /// The configured collection name, e.g. `Org1MSPPrivateCollection`.
    pub fn name(&self) -> String {
        match self {
            CollectionId::Shared => SHARED_COLLECTION_NAME.to_string(),
            CollectionId::Private(org) => org.collection_name(),
        }
    }

    /// The organization a private collection belongs to. `None` for the
    /// shared collection.
    pub fn owner(&self) -> Option<&OrgId> {
        match self {
            CollectionId::Shared => None,
            CollectionId::Private(org) => Some(org),
        }
    }
}

impl std::fmt::Display for CollectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}

// ---------------------------------------------------------------------------
// WriteSet
// ---------------------------------------------------------------------------

/// Buffered writes of one transaction.
///
/// `Some(bytes)` is a put, `None` a delete. Later writes to the same key
/// replace earlier ones, so the set always describes the final state the
/// transaction wants to leave behind.
#[derive(Clone, Debug, Default)]
pub struct WriteSet {
    writes: BTreeMap<CollectionId, BTreeMap<String, Option<Vec<u8>>>>,
    record: Option<TransactionRecord>,
}

impl WriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, collection: &CollectionId, key: &str, value: Vec<u8>) {
        self.writes
            .entry(collection.clone())
            .or_default()
            .insert(key.to_string(), Some(value));
    }

    pub fn delete(&mut self, collection: &CollectionId, key: &str) {
        self.writes
            .entry(collection.clone())
            .or_default()
            .insert(key.to_string(), None);
    }

    /// Pending state of a key.
    ///
    /// - `None` — this transaction has not touched the key.
    /// - `Some(None)` — deleted by this transaction.
    /// - `Some(Some(bytes))` — written by this transaction.
    pub fn pending(&self, collection: &CollectionId, key: &str) -> Option<Option<&[u8]>> {
        self.writes
            .get(collection)
            .and_then(|c| c.get(key))
            .map(|v| v.as_deref())
    }

    /// Attach the history record that commits together with these writes.
    pub fn set_record(&mut self, record: TransactionRecord) {
        self.record = Some(record);
    }

    pub fn record(&self) -> Option<&TransactionRecord> {
        self.record.as_ref()
    }

    /// True when there are no key writes. A record alone does not count.
    pub fn is_empty(&self) -> bool {
        self.writes.values().all(|c| c.is_empty())
    }

    /// Number of key writes across all collections.
    pub fn len(&self) -> usize {
        self.writes.values().map(|c| c.len()).sum()
    }

    /// Collections this transaction writes to.
    pub fn collections(&self) -> impl Iterator<Item = &CollectionId> {
        self.writes.keys()
    }

    /// Iterate `(collection, key, value)` triples in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = (&CollectionId, &str, Option<&[u8]>)> {
        self.writes.iter().flat_map(|(collection, entries)| {
            entries
                .iter()
                .map(move |(key, value)| (collection, key.as_str(), value.as_deref()))
        })
    }

    /// Split into the raw parts, consuming the set.
    pub fn into_parts(
        self,
    ) -> (
        BTreeMap<CollectionId, BTreeMap<String, Option<Vec<u8>>>>,
        Option<TransactionRecord>,
    ) {
        (self.writes, self.record)
    }
}

// ---------------------------------------------------------------------------
// CollectionStore
// ---------------------------------------------------------------------------

/// A partitioned key-value backend.
///
/// Implementations must keep each [`CollectionId`] in its own keyspace and
/// must apply a [`WriteSet`] atomically: after `commit` returns, either every
/// write and the attached record are visible, or none are.
pub trait CollectionStore: Send + Sync {
    /// Read a key from one collection.
    fn get(&self, collection: &CollectionId, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// `(key, value)` pairs of a collection whose key starts with `prefix`,
    /// in key order.
    fn scan_prefix(
        &self,
        collection: &CollectionId,
        prefix: &str,
    ) -> StoreResult<Vec<(String, Vec<u8>)>>;

    /// Apply a write set atomically.
    fn commit(&self, writes: WriteSet) -> StoreResult<()>;

    /// Committed history, oldest first.
    fn history(&self) -> StoreResult<Vec<TransactionRecord>>;

    /// All `(key, value)` pairs of a collection in key order.
    fn scan(&self, collection: &CollectionId) -> StoreResult<Vec<(String, Vec<u8>)>> {
        self.scan_prefix(collection, "")
    }

    /// Overwrite a single key. Shorthand for a one-entry write set.
    fn put(&self, collection: &CollectionId, key: &str, value: Vec<u8>) -> StoreResult<()> {
        let mut writes = WriteSet::new();
        writes.put(collection, key, value);
        self.commit(writes)
    }

    /// Delete a single key. Deleting a missing key is not an error.
    fn delete(&self, collection: &CollectionId, key: &str) -> StoreResult<()> {
        let mut writes = WriteSet::new();
        writes.delete(collection, key);
        self.commit(writes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_names() {
        assert_eq!(CollectionId::Shared.name(), "assetCollection");
        let org1 = CollectionId::private(&OrgId::new("Org1MSP"));
        assert_eq!(org1.name(), "Org1MSPPrivateCollection");
        assert_eq!(org1.owner(), Some(&OrgId::new("Org1MSP")));
        assert_eq!(CollectionId::Shared.owner(), None);
    }

    #[test]
    fn last_write_wins_within_a_set() {
        let c = CollectionId::Shared;
        let mut ws = WriteSet::new();
        ws.put(&c, "asset1", b"one".to_vec());
        ws.put(&c, "asset1", b"two".to_vec());
        assert_eq!(ws.pending(&c, "asset1"), Some(Some(&b"two"[..])));
        ws.delete(&c, "asset1");
        assert_eq!(ws.pending(&c, "asset1"), Some(None));
        assert_eq!(ws.len(), 1);
    }

    #[test]
    fn pending_is_scoped_to_collection() {
        let org1 = CollectionId::private(&OrgId::new("Org1MSP"));
        let org2 = CollectionId::private(&OrgId::new("Org2MSP"));
        let mut ws = WriteSet::new();
        ws.put(&org1, "asset1", b"secret".to_vec());
        assert!(ws.pending(&org2, "asset1").is_none());
        assert!(ws.pending(&CollectionId::Shared, "asset1").is_none());
    }

    #[test]
    fn record_alone_is_empty() {
        let mut ws = WriteSet::new();
        ws.set_record(TransactionRecord::new(
            "ReadAsset",
            vec![],
            crate::identity::CallerIdentity::new("Org1MSP", "u"),
        ));
        assert!(ws.is_empty());
        assert!(ws.record().is_some());
    }
}
