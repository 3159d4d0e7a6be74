//! # Asset Ledger
//!
//! Entry point for callers. [`AssetLedger`] owns the store handle and a
//! per-asset lock table, and offers two ways to run an operation:
//!
//! - **submit** — lock the asset, execute, attach a history record and
//!   commit everything as one write set.
//! - **evaluate** — execute against the current state and throw the writes
//!   away. Takes no lock and leaves no history.
//!
//! Operations on different assets never contend. Operations on the same
//! asset are serialized for the whole read-execute-commit window, so no two
//! of them can act on the same observed state.
//!
//! The lock table only holds assets with a submission in flight. The asset
//! ID is validated before an entry is created, and the last holder removes
//! the entry on the way out.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use tessera_protocol::identity::CallerIdentity;
use tessera_protocol::storage::{CollectionStore, StoreResult, TransactionRecord};

use crate::context::TxContext;
use crate::dispatch::{execute, Operation, Response};
use crate::error::{ContractError, InvocationError};
use crate::transient::{validate_asset_id, Transient};

/// Lock table keyed by asset ID.
#[derive(Default)]
struct AssetLocks {
    table: DashMap<String, Arc<Mutex<()>>>,
}

impl AssetLocks {
    /// Run `f` while holding the lock for `asset_id`.
    fn with_lock<R>(&self, asset_id: &str, f: impl FnOnce() -> R) -> R {
        // Clone the Arc out so the shard guard is released before locking.
        let handle = self
            .table
            .entry(asset_id.to_string())
            .or_default()
            .value()
            .clone();
        let result = {
            let _guard = handle.lock();
            f()
        };
        drop(handle);
        // Handles are only cloned under the shard lock, so a count of one
        // means nobody is waiting on this entry.
        self.table
            .remove_if(asset_id, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    fn len(&self) -> usize {
        self.table.len()
    }
}

/// The asset-transfer contract bound to a store.
pub struct AssetLedger {
    store: Arc<dyn CollectionStore>,
    locks: AssetLocks,
}

impl AssetLedger {
    pub fn new(store: Arc<dyn CollectionStore>) -> Self {
        Self {
            store,
            locks: AssetLocks::default(),
        }
    }

    pub fn store(&self) -> &Arc<dyn CollectionStore> {
        &self.store
    }

    /// Execute and commit `op` on behalf of `caller`.
    pub fn submit(&self, caller: &CallerIdentity, op: Operation) -> Result<Response, ContractError> {
        let name = op.name();
        let args = op.durable_args();
        let asset_id = op.asset_id().unwrap_or_default().to_string();

        let lock_id = match op.asset_id() {
            Some(id) if !op.is_read_only() => Some(id.to_string()),
            _ => None,
        };

        match lock_id {
            Some(id) => {
                validate_asset_id(&id)?;
                self.locks
                    .with_lock(&id, || self.execute_and_commit(caller, op, name, args, &asset_id))
            }
            None => self.execute_and_commit(caller, op, name, args, &asset_id),
        }
    }

    fn execute_and_commit(
        &self,
        caller: &CallerIdentity,
        op: Operation,
        name: &'static str,
        args: Vec<String>,
        asset_id: &str,
    ) -> Result<Response, ContractError> {
        let mut ctx = TxContext::new(self.store.as_ref(), caller);
        let response = execute(&mut ctx, op).map_err(|e| {
            tracing::debug!(operation = name, asset_id = %asset_id, kind = e.kind(), "operation rejected");
            e
        })?;

        let mut writes = ctx.into_writes();
        let record = TransactionRecord::new(name, args, caller.clone());
        let tx_id = record.tx_id.clone();
        let write_count = writes.len();
        writes.set_record(record);
        self.store
            .commit(writes)
            .map_err(|e| ContractError::ledger(asset_id, e))?;

        tracing::info!(
            tx_id = %tx_id,
            operation = name,
            asset_id = %asset_id,
            org = %caller.org,
            writes = write_count,
            "transaction committed"
        );
        Ok(response)
    }

    /// Execute `op` without committing anything.
    pub fn evaluate(&self, caller: &CallerIdentity, op: Operation) -> Result<Response, ContractError> {
        let mut ctx = TxContext::new(self.store.as_ref(), caller);
        execute(&mut ctx, op)
    }

    /// Decode a named request and submit it.
    pub fn invoke(
        &self,
        caller: &CallerIdentity,
        name: &str,
        args: &[String],
        transient: &Transient,
    ) -> Result<Response, InvocationError> {
        let op = Operation::decode(name, args, transient)?;
        Ok(self.submit(caller, op)?)
    }

    /// Decode a named request and evaluate it.
    pub fn query(
        &self,
        caller: &CallerIdentity,
        name: &str,
        args: &[String],
        transient: &Transient,
    ) -> Result<Response, InvocationError> {
        let op = Operation::decode(name, args, transient)?;
        Ok(self.evaluate(caller, op)?)
    }

    /// Committed transaction history, oldest first.
    pub fn history(&self) -> StoreResult<Vec<TransactionRecord>> {
        self.store.history()
    }

    /// Number of assets with a submission currently in flight.
    pub fn tracked_assets(&self) -> usize {
        self.locks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_protocol::config::{TRANSIENT_ASSET_PROPERTIES, TRANSIENT_ASSET_VALUE};
    use tessera_protocol::storage::MemoryStore;

    fn ledger() -> AssetLedger {
        AssetLedger::new(Arc::new(MemoryStore::new()))
    }

    fn create(ledger: &AssetLedger, caller: &CallerIdentity, id: &str) {
        let t = Transient::new().with(
            TRANSIENT_ASSET_PROPERTIES,
            format!(r#"{{"assetID":"{id}","privateDetail":{{"appraisal":42}}}}"#),
        );
        ledger.invoke(caller, "CreateAsset", &[], &t).unwrap();
    }

    #[test]
    fn submit_records_history() {
        let ledger = ledger();
        let org1 = CallerIdentity::new("Org1MSP", "appUser1");
        create(&ledger, &org1, "asset1");
        ledger
            .invoke(&org1, "ReadAsset", &["asset1".to_string()], &Transient::new())
            .unwrap();

        let history = ledger.history().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].operation, "CreateAsset");
        assert!(history[0].args.is_empty());
        assert_eq!(history[1].args, vec!["asset1".to_string()]);
        assert_eq!(history[1].creator, org1);
    }

    #[test]
    fn evaluate_commits_nothing() {
        let ledger = ledger();
        let org1 = CallerIdentity::new("Org1MSP", "appUser1");
        let t = Transient::new().with(
            TRANSIENT_ASSET_PROPERTIES,
            r#"{"assetID":"asset1"}"#.as_bytes().to_vec(),
        );
        ledger.query(&org1, "CreateAsset", &[], &t).unwrap();
        let exists = ledger
            .query(&org1, "AssetExists", &["asset1".to_string()], &Transient::new())
            .unwrap();
        assert_eq!(exists, Response::Exists(false));
        assert!(ledger.history().unwrap().is_empty());
    }

    #[test]
    fn failed_submit_leaves_no_history() {
        let ledger = ledger();
        let org1 = CallerIdentity::new("Org1MSP", "appUser1");
        let t = Transient::new().with(
            TRANSIENT_ASSET_VALUE,
            r#"{"assetID":"missing","proposedPrice":5}"#.as_bytes().to_vec(),
        );
        let err = ledger.invoke(&org1, "AgreeToTransfer", &[], &t).unwrap_err();
        assert_eq!(err.kind(), "NotFound");
        assert!(ledger.history().unwrap().is_empty());
    }

    #[test]
    fn concurrent_creates_of_one_asset() {
        let ledger = Arc::new(ledger());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let ledger = Arc::clone(&ledger);
                std::thread::spawn(move || {
                    let caller = CallerIdentity::new(format!("Org{i}MSP"), "user");
                    let t = Transient::new().with(
                        TRANSIENT_ASSET_PROPERTIES,
                        r#"{"assetID":"contested"}"#.as_bytes().to_vec(),
                    );
                    ledger.invoke(&caller, "CreateAsset", &[], &t).is_ok()
                })
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(ledger.tracked_assets(), 0);
    }

    #[test]
    fn rejected_submissions_leave_no_locks_behind() {
        let ledger = ledger();
        let org1 = CallerIdentity::new("Org1MSP", "appUser1");
        for i in 0..500 {
            let oversized = format!("{i}-{}", "x".repeat(1_000));
            let missing = format!("missing-{i}");
            for id in [oversized, missing] {
                let t = Transient::new().with(
                    TRANSIENT_ASSET_VALUE,
                    format!(r#"{{"assetID":"{id}","proposedPrice":5}}"#),
                );
                assert!(ledger.invoke(&org1, "AgreeToTransfer", &[], &t).is_err());
            }
        }
        assert_eq!(ledger.tracked_assets(), 0);
        assert!(ledger.history().unwrap().is_empty());
    }

    #[test]
    fn lock_entry_released_after_commit() {
        let ledger = ledger();
        let org1 = CallerIdentity::new("Org1MSP", "appUser1");
        create(&ledger, &org1, "asset1");
        create(&ledger, &org1, "asset2");
        assert_eq!(ledger.tracked_assets(), 0);
    }
}
