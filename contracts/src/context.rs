//! # Transaction Context
//!
//! The only door between contract code and the store. A [`TxContext`] is
//! created per call, reads through to committed state, buffers every write
//! in a [`WriteSet`], and enforces collection capabilities at each access:
//!
//! | Access                         | Shared | Caller's collection | Another org's collection |
//! |--------------------------------|--------|---------------------|--------------------------|
//! | read value                     | yes    | yes                 | no                       |
//! | read SHA-256 of stored value   | yes    | yes                 | yes                      |
//! | write / delete                 | yes    | yes                 | only with a [`WriteGrant`] |
//!
//! Dropping the context without calling [`TxContext::into_writes`] discards
//! everything, which is how failed operations leave no trace.

use tessera_protocol::crypto::Commitment;
use tessera_protocol::identity::CallerIdentity;
use tessera_protocol::storage::{CollectionId, CollectionStore, StoreError, WriteSet};

use crate::authorization::{can_read, can_write, WriteGrant};
use crate::error::ContractError;

/// Failures at the collection boundary.
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("access to collection {0} denied")]
    Denied(CollectionId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AccessError {
    /// Map into the caller-facing error for `asset_id`.
    pub fn for_asset(self, asset_id: &str) -> ContractError {
        match self {
            AccessError::Denied(collection) => {
                tracing::debug!(asset_id, %collection, "collection access denied");
                ContractError::Unauthorized {
                    asset_id: asset_id.to_string(),
                }
            }
            AccessError::Store(e) => ContractError::ledger(asset_id, e),
        }
    }
}

/// Per-call view of the ledger.
pub struct TxContext<'a> {
    store: &'a dyn CollectionStore,
    caller: &'a CallerIdentity,
    writes: WriteSet,
    grants: Vec<WriteGrant>,
}

impl<'a> TxContext<'a> {
    pub fn new(store: &'a dyn CollectionStore, caller: &'a CallerIdentity) -> Self {
        Self {
            store,
            caller,
            writes: WriteSet::new(),
            grants: Vec::new(),
        }
    }

    pub fn caller(&self) -> &CallerIdentity {
        self.caller
    }

    /// The caller's own private collection.
    pub fn own_collection(&self) -> CollectionId {
        CollectionId::private(&self.caller.org)
    }

    fn read(&self, collection: &CollectionId, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match self.writes.pending(collection, key) {
            Some(pending) => Ok(pending.map(|b| b.to_vec())),
            None => self.store.get(collection, key),
        }
    }

    // -- Shared collection ----------------------------------------------------

    pub fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, AccessError> {
        Ok(self.read(&CollectionId::Shared, key)?)
    }

    pub fn put_state(&mut self, key: &str, value: Vec<u8>) {
        self.writes.put(&CollectionId::Shared, key, value);
    }

    pub fn del_state(&mut self, key: &str) {
        self.writes.delete(&CollectionId::Shared, key);
    }

    /// Every live `(key, value)` in the shared collection whose key starts
    /// with `prefix`, including this transaction's own pending writes.
    pub fn scan_state(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, AccessError> {
        let shared = CollectionId::Shared;
        let mut entries: std::collections::BTreeMap<String, Vec<u8>> =
            self.store.scan_prefix(&shared, prefix)?.into_iter().collect();
        for (collection, key, value) in self.writes.iter() {
            if *collection != shared || !key.starts_with(prefix) {
                continue;
            }
            match value {
                Some(bytes) => {
                    entries.insert(key.to_string(), bytes.to_vec());
                }
                None => {
                    entries.remove(key);
                }
            }
        }
        Ok(entries.into_iter().collect())
    }

    // -- Private collections --------------------------------------------------

    pub fn get_private(
        &self,
        collection: &CollectionId,
        key: &str,
    ) -> Result<Option<Vec<u8>>, AccessError> {
        if !can_read(self.caller, collection) {
            return Err(AccessError::Denied(collection.clone()));
        }
        Ok(self.read(collection, key)?)
    }

    /// SHA-256 of the value stored under `key`, readable by anyone.
    pub fn private_data_hash(
        &self,
        collection: &CollectionId,
        key: &str,
    ) -> Result<Option<Commitment>, AccessError> {
        Ok(self
            .read(collection, key)?
            .map(|bytes| Commitment::of_stored(&bytes)))
    }

    pub fn put_private(
        &mut self,
        collection: &CollectionId,
        key: &str,
        value: Vec<u8>,
    ) -> Result<(), AccessError> {
        if !can_write(self.caller, collection, &self.grants) {
            return Err(AccessError::Denied(collection.clone()));
        }
        self.writes.put(collection, key, value);
        Ok(())
    }

    pub fn del_private(&mut self, collection: &CollectionId, key: &str) -> Result<(), AccessError> {
        if !can_write(self.caller, collection, &self.grants) {
            return Err(AccessError::Denied(collection.clone()));
        }
        self.writes.delete(collection, key);
        Ok(())
    }

    /// Accept a write grant issued by the authorization engine.
    pub fn accept_grant(&mut self, grant: WriteGrant) {
        self.grants.push(grant);
    }

    /// Finish the call and hand back the buffered writes.
    pub fn into_writes(self) -> WriteSet {
        self.writes
    }
}
