//! Integration tests running the contract over the on-disk sled backend.

use std::sync::Arc;

use tessera_contracts::{AssetLedger, Response, Transient};
use tessera_protocol::config::{
    TRANSIENT_ASSET_OWNER, TRANSIENT_ASSET_PROPERTIES, TRANSIENT_ASSET_VALUE,
};
use tessera_protocol::identity::{CallerIdentity, OrgId};
use tessera_protocol::storage::{CollectionId, CollectionStore, SledStore};

fn org1() -> CallerIdentity {
    CallerIdentity::new("Org1MSP", "appUser1")
}

fn org2() -> CallerIdentity {
    CallerIdentity::new("Org2MSP", "appUser2")
}

fn trade(ledger: &AssetLedger, buyer_price: u64) -> Result<Response, tessera_contracts::InvocationError> {
    let props = Transient::new().with(
        TRANSIENT_ASSET_PROPERTIES,
        r#"{"assetID":"asset1","privateDetail":{"serial":"SN-001"}}"#,
    );
    ledger.invoke(&org1(), "CreateAsset", &[], &props)?;

    let seller = Transient::new().with(
        TRANSIENT_ASSET_VALUE,
        r#"{"assetID":"asset1","proposedPrice":100}"#,
    );
    ledger.invoke(&org1(), "AgreeToTransfer", &[], &seller)?;

    let buyer = Transient::new().with(
        TRANSIENT_ASSET_VALUE,
        format!(r#"{{"assetID":"asset1","proposedPrice":{buyer_price}}}"#),
    );
    ledger.invoke(&org2(), "AgreeToTransfer", &[], &buyer)?;

    let owner = Transient::new().with(
        TRANSIENT_ASSET_OWNER,
        r#"{"assetID":"asset1","buyerOrg":"Org2MSP"}"#,
    );
    ledger.invoke(&org1(), "TransferAsset", &[], &owner)
}

#[test]
fn transfer_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();

    {
        let store = Arc::new(SledStore::open(dir.path()).unwrap());
        let ledger = AssetLedger::new(store.clone());
        trade(&ledger, 100).unwrap();
        store.flush().unwrap();
    }

    let store = Arc::new(SledStore::open(dir.path()).unwrap());
    assert_eq!(store.history_len(), 4);
    let ledger = AssetLedger::new(store.clone());
    match ledger
        .query(&org2(), "ReadAsset", &["asset1".to_string()], &Transient::new())
        .unwrap()
    {
        Response::Asset(asset) => assert_eq!(asset.owner_org, OrgId::new("Org2MSP")),
        other => panic!("unexpected response {other:?}"),
    }
    let org1_collection = CollectionId::private(&OrgId::new("Org1MSP"));
    assert!(store.get(&org1_collection, "asset1").unwrap().is_none());
    assert!(ledger
        .query(&org2(), "ReadPrivateDetail", &["asset1".to_string()], &Transient::new())
        .is_ok());
}

#[test]
fn failed_transfer_writes_nothing() {
    let store = Arc::new(SledStore::open_temporary().unwrap());
    let ledger = AssetLedger::new(store.clone());

    let err = trade(&ledger, 90).unwrap_err();
    assert_eq!(err.kind(), "PriceMismatch");
    assert_eq!(store.history_len(), 3);

    let org1_collection = CollectionId::private(&OrgId::new("Org1MSP"));
    let org2_collection = CollectionId::private(&OrgId::new("Org2MSP"));
    assert!(store.get(&org1_collection, "asset1").unwrap().is_some());
    assert!(store.get(&org2_collection, "asset1").unwrap().is_none());

    let history = ledger.history().unwrap();
    let ops: Vec<_> = history.iter().map(|r| r.operation.as_str()).collect();
    assert_eq!(ops, vec!["CreateAsset", "AgreeToTransfer", "AgreeToTransfer"]);
}
