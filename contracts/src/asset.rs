//! # Asset Records
//!
//! The records the contract keeps, and where each one lives:
//!
//! | Record              | Collection              | Key                                   |
//! |---------------------|-------------------------|---------------------------------------|
//! | [`Asset`]           | shared                  | `assetID`                             |
//! | [`TransferAgreement`]| shared                 | `\0transferAgreement\0assetID\0org\0` |
//! | [`PrivateDetail`]   | owner's private         | `assetID`                             |
//! | [`PriceAgreement`]  | buyer's private         | `\0priceAgreement\0assetID\0`         |
//!
//! Every record is stored as canonical JSON. For `PriceAgreement` this is
//! load-bearing: the SHA-256 of the stored bytes is compared against the
//! seller's public commitment.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use tessera_protocol::config::{PRICE_AGREEMENT_PREFIX, TRANSFER_AGREEMENT_PREFIX};
use tessera_protocol::crypto::Commitment;
use tessera_protocol::identity::OrgId;

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Lifecycle state of an asset.
///
/// ```text
/// Created --AgreeToTransfer(owner)--> AgreementPending
/// AgreementPending --TransferAsset--> Created (new owner)
/// AgreementPending --CancelAgreement--> Created
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetState {
    /// Owned, no asking price committed.
    Created,
    /// The owner has committed an asking price hash.
    AgreementPending,
}

impl std::fmt::Display for AssetState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetState::Created => write!(f, "Created"),
            AssetState::AgreementPending => write!(f, "AgreementPending"),
        }
    }
}

// ---------------------------------------------------------------------------
// Public record
// ---------------------------------------------------------------------------

/// The public asset record, readable by every participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    /// Type tag, e.g. `ValuableAsset`.
    pub object_type: String,
    #[serde(rename = "assetID")]
    pub asset_id: String,
    /// Organization whose private collection holds the authoritative detail.
    pub owner_org: OrgId,
    /// User within `owner_org` that controls the asset.
    pub owner_user: String,
    /// Non-sensitive display fields.
    #[serde(default)]
    pub public_attributes: Map<String, Value>,
    pub state: AssetState,
    /// Commitment to the owner's asking price. Set only while
    /// `state == AgreementPending`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agreed_price_hash: Option<Commitment>,
    /// Completed transfers so far. Buyer intents are only honoured within
    /// the cycle they were published in.
    #[serde(default)]
    pub sale_cycle: u64,
}

// ---------------------------------------------------------------------------
// Private records
// ---------------------------------------------------------------------------

/// Sensitive attributes, held only in the owning organization's collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateDetail {
    #[serde(rename = "assetID")]
    pub asset_id: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

/// A buyer's price proposal, held in the buyer's own collection.
///
/// The seller commits to the canonical encoding of this same structure, so
/// when both sides name the same price for the same asset the digests match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceAgreement {
    #[serde(rename = "assetID")]
    pub asset_id: String,
    pub proposed_price: u64,
}

/// Public marker that an organization intends to buy an asset. Carries no
/// price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferAgreement {
    #[serde(rename = "assetID")]
    pub asset_id: String,
    pub buyer_org: OrgId,
    pub buyer_user: String,
    /// `Asset::sale_cycle` at the time the buyer agreed.
    #[serde(default)]
    pub sale_cycle: u64,
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Build a composite key: `\0type\0attr1\0attr2\0`.
///
/// The leading NUL keeps composite keys out of the plain asset-ID keyspace;
/// asset IDs are rejected if they contain NUL.
pub fn composite_key(object_type: &str, attributes: &[&str]) -> String {
    let mut key = String::from('\u{0}');
    key.push_str(object_type);
    key.push('\u{0}');
    for attr in attributes {
        key.push_str(attr);
        key.push('\u{0}');
    }
    key
}

/// True for keys produced by [`composite_key`].
pub fn is_composite_key(key: &str) -> bool {
    key.starts_with('\u{0}')
}

/// Key of a buyer's [`PriceAgreement`] in its own collection.
pub fn price_agreement_key(asset_id: &str) -> String {
    composite_key(PRICE_AGREEMENT_PREFIX, &[asset_id])
}

/// Key of a [`TransferAgreement`] in the shared collection.
pub fn transfer_agreement_key(asset_id: &str, buyer_org: &OrgId) -> String {
    composite_key(TRANSFER_AGREEMENT_PREFIX, &[asset_id, buyer_org.as_str()])
}

/// Prefix shared by every buyer's [`TransferAgreement`] for one asset.
pub fn transfer_agreements_prefix(asset_id: &str) -> String {
    composite_key(TRANSFER_AGREEMENT_PREFIX, &[asset_id])
}
