//! Integration tests for private-collection partitioning.
//!
//! What one organization writes to its collection must never be readable
//! by another, must move intact on transfer, and must never show up in the
//! durable history.

use std::sync::Arc;

use tessera_contracts::{AssetLedger, PriceAgreement, PrivateDetail, Response, Transient};
use tessera_protocol::config::{
    TRANSIENT_ASSET_OWNER, TRANSIENT_ASSET_PROPERTIES, TRANSIENT_ASSET_VALUE,
};
use tessera_protocol::crypto::{commit_value, Commitment};
use tessera_protocol::identity::{CallerIdentity, OrgId};
use tessera_protocol::storage::{CollectionId, CollectionStore, MemoryStore};

const SECRET: &str = "the appraisal nobody else may see";

struct Fixture {
    store: Arc<MemoryStore>,
    ledger: AssetLedger,
    org1: CallerIdentity,
    org2: CallerIdentity,
}

fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let ledger = AssetLedger::new(store.clone());
    Fixture {
        store,
        ledger,
        org1: CallerIdentity::new("Org1MSP", "appUser1"),
        org2: CallerIdentity::new("Org2MSP", "appUser2"),
    }
}

fn create(f: &Fixture) {
    let props = format!(
        r#"{{"assetID":"asset1","publicAttributes":{{"color":"green"}},"privateDetail":{{"essay":"{SECRET}"}}}}"#
    );
    let t = Transient::new().with(TRANSIENT_ASSET_PROPERTIES, props);
    f.ledger.invoke(&f.org1, "CreateAsset", &[], &t).unwrap();
}

fn agree(f: &Fixture, caller: &CallerIdentity, price: u64) {
    let t = Transient::new().with(
        TRANSIENT_ASSET_VALUE,
        format!(r#"{{"assetID":"asset1","proposedPrice":{price}}}"#),
    );
    f.ledger.invoke(caller, "AgreeToTransfer", &[], &t).unwrap();
}

fn private_detail(f: &Fixture, caller: &CallerIdentity) -> Option<PrivateDetail> {
    match f
        .ledger
        .query(caller, "ReadPrivateDetail", &["asset1".to_string()], &Transient::new())
    {
        Ok(Response::PrivateDetail(detail)) => Some(detail),
        _ => None,
    }
}

#[test]
fn only_creator_reads_private_detail() {
    let f = fixture();
    create(&f);

    let detail = private_detail(&f, &f.org1).unwrap();
    assert_eq!(detail.attributes["essay"], SECRET);
    assert!(private_detail(&f, &f.org2).is_none());

    let org2_collection = CollectionId::private(&OrgId::new("Org2MSP"));
    assert_eq!(f.store.len(&org2_collection), 0);
}

#[test]
fn public_record_carries_no_private_fields() {
    let f = fixture();
    create(&f);
    let public = f.store.get(&CollectionId::Shared, "asset1").unwrap().unwrap();
    let text = String::from_utf8(public).unwrap();
    assert!(text.contains("green"));
    assert!(!text.contains(SECRET));
}

#[test]
fn detail_moves_intact() {
    let f = fixture();
    create(&f);
    let before = private_detail(&f, &f.org1).unwrap();
    let org1_bytes = f
        .store
        .get(&CollectionId::private(&OrgId::new("Org1MSP")), "asset1")
        .unwrap();

    agree(&f, &f.org1, 100);
    agree(&f, &f.org2, 100);
    let t = Transient::new().with(
        TRANSIENT_ASSET_OWNER,
        r#"{"assetID":"asset1","buyerOrg":"Org2MSP"}"#,
    );
    f.ledger.invoke(&f.org1, "TransferAsset", &[], &t).unwrap();

    assert_eq!(private_detail(&f, &f.org2), Some(before));
    assert!(private_detail(&f, &f.org1).is_none());
    let org2_bytes = f
        .store
        .get(&CollectionId::private(&OrgId::new("Org2MSP")), "asset1")
        .unwrap();
    assert_eq!(org2_bytes, org1_bytes);
}

#[test]
fn buyer_agreement_hash_matches_commitment() {
    let f = fixture();
    create(&f);
    agree(&f, &f.org2, 100);

    let agreement = match f
        .ledger
        .query(&f.org2, "ReadPriceAgreement", &["asset1".to_string()], &Transient::new())
        .unwrap()
    {
        Response::PriceAgreement(a) => a,
        other => panic!("unexpected response {other:?}"),
    };
    assert_eq!(agreement.proposed_price, 100);

    // The seller cannot read the buyer's agreement, only its hash.
    let err = f
        .ledger
        .query(&f.org1, "ReadPriceAgreement", &["asset1".to_string()], &Transient::new())
        .unwrap_err();
    assert_eq!(err.kind(), "NotFound");

    let stored = f
        .store
        .get(
            &CollectionId::private(&OrgId::new("Org2MSP")),
            &tessera_contracts::asset::price_agreement_key("asset1"),
        )
        .unwrap()
        .unwrap();
    let expected = commit_value(&PriceAgreement {
        asset_id: "asset1".into(),
        proposed_price: 100,
    })
    .unwrap();
    assert_eq!(Commitment::of_stored(&stored), expected);
}

#[test]
fn history_holds_no_transient_data() {
    let f = fixture();
    create(&f);
    agree(&f, &f.org1, 918273645);
    agree(&f, &f.org2, 918273645);

    let history = f.ledger.history().unwrap();
    assert_eq!(history.len(), 3);
    let dump = serde_json::to_string(&history).unwrap();
    assert!(!dump.contains(SECRET));
    assert!(!dump.contains("918273645"));
    for record in &history {
        assert!(record.args.is_empty());
    }
    assert_eq!(history[0].creator, f.org1);
    assert_eq!(history[2].creator, f.org2);
}
