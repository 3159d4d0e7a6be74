//! # Transaction History
//!
//! Every committed submission leaves a [`TransactionRecord`] behind. The
//! record holds the operation name and its *durable* arguments only. There
//! is no field for transient data, and the contract-side transient map does
//! not implement `Serialize`, so private attributes and prices cannot end up
//! here by accident.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{CONTRACT_NAME, TX_ID_DOMAIN};
use crate::crypto::hash::domain_separated_hash;
use crate::identity::CallerIdentity;

/// A committed transaction as it appears in ledger history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Hex-encoded BLAKE3 transaction ID.
    pub tx_id: String,
    /// Contract that executed the operation.
    pub contract: String,
    /// Operation name, e.g. `TransferAsset`.
    pub operation: String,
    /// Durable arguments as submitted.
    pub args: Vec<String>,
    /// The authenticated submitter.
    pub creator: CallerIdentity,
    /// Commit time.
    pub timestamp: DateTime<Utc>,
}

impl TransactionRecord {
    /// Build a record with a fresh transaction ID.
    ///
    /// The ID is `BLAKE3-derive-key(TX_ID_DOMAIN, nonce || creator)`, so two
    /// identical submissions by the same caller still get distinct IDs.
    pub fn new(operation: impl Into<String>, args: Vec<String>, creator: CallerIdentity) -> Self {
        let nonce = Uuid::new_v4();
        let client_id = creator.client_id();
        let tx_id = domain_separated_hash(
            TX_ID_DOMAIN,
            &[nonce.as_bytes().as_slice(), client_id.as_bytes()],
        );
        Self {
            tx_id: hex::encode(tx_id),
            contract: CONTRACT_NAME.to_string(),
            operation: operation.into(),
            args,
            creator,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tx_ids_are_unique() {
        let caller = CallerIdentity::new("Org1MSP", "appUser1");
        let a = TransactionRecord::new("ReadAsset", vec!["asset1".into()], caller.clone());
        let b = TransactionRecord::new("ReadAsset", vec!["asset1".into()], caller);
        assert_ne!(a.tx_id, b.tx_id);
        assert_eq!(a.tx_id.len(), 64);
    }

    #[test]
    fn bincode_round_trip() {
        let caller = CallerIdentity::new("Org1MSP", "appUser1");
        let record = TransactionRecord::new("CreateAsset", vec![], caller);
        let bytes = bincode::serialize(&record).unwrap();
        let back: TransactionRecord = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, record);
    }
}
