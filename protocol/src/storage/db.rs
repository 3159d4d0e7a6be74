//! # SledStore — Persistent Collection Backend
//!
//! Built on sled's embedded key-value store.
//!
//! ## Tree Layout
//!
//! | Tree                               | Key                 | Value                        |
//! |------------------------------------|---------------------|------------------------------|
//! | `collection/assetCollection`       | asset key (UTF-8)   | canonical JSON record        |
//! | `collection/<MSP>PrivateCollection`| asset key (UTF-8)   | canonical JSON record        |
//! | `history`                          | `seq` (8B BE)       | `bincode(TransactionRecord)` |
//!
//! Collection values are stored exactly as the contract produced them. They
//! must not be re-encoded here, because other organizations compare SHA-256
//! digests of these bytes against public commitments.
//!
//! ## Atomicity
//!
//! `commit` opens every tree the write set touches plus `history` and runs a
//! single sled multi-tree transaction over them. Either every write and the
//! history entry land, or nothing does.

use std::path::Path;

use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::{Db, Transactional, Tree};

use super::collection::{CollectionId, CollectionStore, StoreError, StoreResult, WriteSet};
use super::history::TransactionRecord;

/// Prefix of every collection tree name.
const COLLECTION_TREE_PREFIX: &str = "collection/";

/// Tree holding the transaction history.
const HISTORY_TREE: &str = "history";

/// Persistent [`CollectionStore`] over sled.
///
/// sled trees support lock-free concurrent reads and serialized writes, so
/// `SledStore` can be shared across threads via `Arc` without extra locking.
#[derive(Debug, Clone)]
pub struct SledStore {
    db: Db,
    history: Tree,
}

impl SledStore {
    /// Open or create a database at the given filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Create a temporary database that is removed when dropped.
    pub fn open_temporary() -> StoreResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> StoreResult<Self> {
        let history = db.open_tree(HISTORY_TREE)?;
        tracing::debug!(
            trees = db.tree_names().len(),
            history = history.len(),
            "sled store opened"
        );
        Ok(Self { db, history })
    }

    fn tree_for(&self, collection: &CollectionId) -> StoreResult<Tree> {
        let name = format!("{}{}", COLLECTION_TREE_PREFIX, collection.name());
        Ok(self.db.open_tree(name)?)
    }

    /// Number of committed history entries.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Flush dirty buffers to disk.
    pub fn flush(&self) -> StoreResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

impl CollectionStore for SledStore {
    fn get(&self, collection: &CollectionId, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let tree = self.tree_for(collection)?;
        Ok(tree.get(key.as_bytes())?.map(|v| v.to_vec()))
    }

    fn scan_prefix(
        &self,
        collection: &CollectionId,
        prefix: &str,
    ) -> StoreResult<Vec<(String, Vec<u8>)>> {
        let tree = self.tree_for(collection)?;
        let mut out = Vec::new();
        for entry in tree.scan_prefix(prefix.as_bytes()) {
            let (key, value) = entry?;
            let key = String::from_utf8(key.to_vec()).map_err(|_| StoreError::CorruptKey {
                collection: collection.name(),
            })?;
            out.push((key, value.to_vec()));
        }
        Ok(out)
    }

    fn commit(&self, writes: WriteSet) -> StoreResult<()> {
        let (writes, record) = writes.into_parts();

        let history_entry = match record {
            Some(record) => {
                let seq = self.db.generate_id()?;
                let bytes = bincode::serialize(&record)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                Some((seq.to_be_bytes(), bytes))
            }
            None => None,
        };

        // Index 0 is always the history tree; collection trees follow in
        // write-set order.
        let mut trees = Vec::with_capacity(writes.len() + 1);
        trees.push(self.history.clone());
        for collection in writes.keys() {
            trees.push(self.tree_for(collection)?);
        }

        let result: Result<(), TransactionError<()>> = trees.as_slice().transaction(|views| {
            if let Some((seq, bytes)) = &history_entry {
                views[0].insert(&seq[..], bytes.as_slice())?;
            }
            for (view, entries) in views[1..].iter().zip(writes.values()) {
                for (key, value) in entries {
                    match value {
                        Some(bytes) => {
                            view.insert(key.as_bytes(), bytes.as_slice())?;
                        }
                        None => {
                            view.remove(key.as_bytes())?;
                        }
                    }
                }
            }
            Ok::<(), ConflictableTransactionError<()>>(())
        });

        match result {
            Ok(()) => {}
            Err(TransactionError::Storage(e)) => {
                tracing::error!(error = %e, "sled transaction failed");
                return Err(StoreError::Sled(e));
            }
            Err(TransactionError::Abort(())) => return Err(StoreError::Aborted),
        }

        self.db.flush()?;
        Ok(())
    }

    fn history(&self) -> StoreResult<Vec<TransactionRecord>> {
        let mut out = Vec::with_capacity(self.history.len());
        for entry in self.history.iter() {
            let (_seq, bytes) = entry?;
            let record: TransactionRecord = bincode::deserialize(&bytes)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            out.push(record);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{CallerIdentity, OrgId};

    fn org(id: &str) -> CollectionId {
        CollectionId::private(&OrgId::new(id))
    }

    #[test]
    fn put_get_delete() {
        let store = SledStore::open_temporary().unwrap();
        let c = org("Org1MSP");
        store.put(&c, "asset1", b"detail".to_vec()).unwrap();
        assert_eq!(store.get(&c, "asset1").unwrap(), Some(b"detail".to_vec()));
        store.delete(&c, "asset1").unwrap();
        assert_eq!(store.get(&c, "asset1").unwrap(), None);
    }

    #[test]
    fn collections_are_separate_trees() {
        let store = SledStore::open_temporary().unwrap();
        store.put(&org("Org1MSP"), "asset1", b"org1".to_vec()).unwrap();
        assert_eq!(store.get(&org("Org2MSP"), "asset1").unwrap(), None);
        assert_eq!(store.get(&CollectionId::Shared, "asset1").unwrap(), None);
    }

    #[test]
    fn commit_spans_collections_and_history() {
        let store = SledStore::open_temporary().unwrap();
        let mut ws = WriteSet::new();
        ws.put(&CollectionId::Shared, "asset1", b"public".to_vec());
        ws.put(&org("Org1MSP"), "asset1", b"private".to_vec());
        ws.delete(&org("Org2MSP"), "asset1");
        ws.set_record(TransactionRecord::new(
            "CreateAsset",
            vec![],
            CallerIdentity::new("Org1MSP", "appUser1"),
        ));
        store.commit(ws).unwrap();

        assert_eq!(
            store.get(&CollectionId::Shared, "asset1").unwrap(),
            Some(b"public".to_vec())
        );
        assert_eq!(
            store.get(&org("Org1MSP"), "asset1").unwrap(),
            Some(b"private".to_vec())
        );
        assert_eq!(store.history_len(), 1);
        assert_eq!(store.history().unwrap()[0].operation, "CreateAsset");
    }

    #[test]
    fn history_is_ordered() {
        let store = SledStore::open_temporary().unwrap();
        let caller = CallerIdentity::new("Org1MSP", "appUser1");
        for op in ["CreateAsset", "AgreeToTransfer", "TransferAsset"] {
            let mut ws = WriteSet::new();
            ws.set_record(TransactionRecord::new(op, vec![], caller.clone()));
            store.commit(ws).unwrap();
        }
        let ops: Vec<String> = store
            .history()
            .unwrap()
            .into_iter()
            .map(|r| r.operation)
            .collect();
        assert_eq!(ops, vec!["CreateAsset", "AgreeToTransfer", "TransferAsset"]);
    }

    #[test]
    fn reopen_preserves_data() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = SledStore::open(dir.path()).unwrap();
            store
                .put(&org("Org1MSP"), "asset1", b"durable".to_vec())
                .unwrap();
        }
        let store = SledStore::open(dir.path()).unwrap();
        assert_eq!(
            store.get(&org("Org1MSP"), "asset1").unwrap(),
            Some(b"durable".to_vec())
        );
    }
}
