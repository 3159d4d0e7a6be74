//! # Authorization
//!
//! Who may touch which collection, and whether a transfer may proceed.
//!
//! Collection rules are plain functions of the caller's organization. The
//! only way to write into another organization's collection is a
//! [`WriteGrant`], and the only code that issues one is
//! [`authorize_transfer`], after the buyer's agreement has been verified
//! against the seller's commitment.

use tessera_protocol::identity::{CallerIdentity, OrgId};
use tessera_protocol::storage::CollectionId;

use crate::asset::{price_agreement_key, transfer_agreement_key, Asset, AssetState, TransferAgreement};
use crate::context::TxContext;
use crate::error::ContractError;

// ---------------------------------------------------------------------------
// Collection capabilities
// ---------------------------------------------------------------------------

/// Permission to write one foreign private collection for the rest of a
/// transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteGrant {
    collection: CollectionId,
}

impl WriteGrant {
    pub(crate) fn new(collection: CollectionId) -> Self {
        Self { collection }
    }

    pub fn collection(&self) -> &CollectionId {
        &self.collection
    }
}

/// The shared collection is readable by everyone; a private collection only
/// by its own organization.
pub fn can_read(caller: &CallerIdentity, collection: &CollectionId) -> bool {
    match collection.owner() {
        None => true,
        Some(org) => *org == caller.org,
    }
}

/// Like [`can_read`], plus any collection covered by a grant.
pub fn can_write(caller: &CallerIdentity, collection: &CollectionId, grants: &[WriteGrant]) -> bool {
    can_read(caller, collection) || grants.iter().any(|g| g.collection == *collection)
}

// ---------------------------------------------------------------------------
// Asset checks
// ---------------------------------------------------------------------------

/// The caller's organization must own the asset.
pub fn ensure_owner(caller: &CallerIdentity, asset: &Asset) -> Result<(), ContractError> {
    if asset.owner_org != caller.org {
        tracing::debug!(
            asset_id = %asset.asset_id,
            owner = %asset.owner_org,
            caller = %caller.org,
            "caller does not own asset"
        );
        return Err(ContractError::Unauthorized {
            asset_id: asset.asset_id.clone(),
        });
    }
    Ok(())
}

pub fn ensure_state(asset: &Asset, expected: AssetState) -> Result<(), ContractError> {
    if asset.state != expected {
        return Err(ContractError::InvalidState {
            asset_id: asset.asset_id.clone(),
            current: asset.state.to_string(),
            expected: expected.to_string(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Transfer authorization
// ---------------------------------------------------------------------------

/// Outcome of a successful transfer check.
#[derive(Debug)]
pub struct TransferAuthorization {
    /// The buyer's public intent, naming the user who becomes owner.
    pub agreement: TransferAgreement,
    /// Write access to the buyer's collection.
    pub grant: WriteGrant,
}

/// Verify that `asset` may move to `buyer_org`.
///
/// Checks run in a fixed order so the error is deterministic:
///
/// 1. caller owns the asset (`Unauthorized`)
/// 2. asset is `AgreementPending` with a committed price (`InvalidState`)
/// 3. buyer differs from the owner (`InvalidPayload`)
/// 4. buyer published a transfer agreement during the current sale cycle
///    (`AgreementMissing`)
/// 5. buyer holds a price agreement (`AgreementMissing`)
/// 6. the buyer's stored hash equals the seller's commitment (`PriceMismatch`)
///
/// Step 6 reads only the SHA-256 of the buyer's record, never the record
/// itself. A buyer's private agreement is never deleted by someone else's
/// sale, so step 4 is what keeps an agreement made with a previous owner
/// from being reused: the public intent is written together with the price
/// agreement and carries the cycle it belongs to.
pub fn authorize_transfer(
    ctx: &TxContext<'_>,
    asset: &Asset,
    buyer_org: &OrgId,
) -> Result<TransferAuthorization, ContractError> {
    let asset_id = asset.asset_id.as_str();

    ensure_owner(ctx.caller(), asset)?;
    ensure_state(asset, AssetState::AgreementPending)?;
    let committed = asset.agreed_price_hash.ok_or_else(|| ContractError::InvalidState {
        asset_id: asset_id.to_string(),
        current: "AgreementPending without committed price".to_string(),
        expected: AssetState::AgreementPending.to_string(),
    })?;

    if *buyer_org == asset.owner_org {
        return Err(ContractError::invalid_payload(
            asset_id,
            "buyer organization already owns the asset",
        ));
    }

    let missing = || ContractError::AgreementMissing {
        asset_id: asset_id.to_string(),
        buyer_org: buyer_org.to_string(),
    };

    let agreement_bytes = ctx
        .get_state(&transfer_agreement_key(asset_id, buyer_org))
        .map_err(|e| e.for_asset(asset_id))?
        .ok_or_else(missing)?;
    let agreement: TransferAgreement = serde_json::from_slice(&agreement_bytes).map_err(|e| {
        tracing::error!(asset_id, error = %e, "unreadable transfer agreement");
        ContractError::Ledger {
            asset_id: asset_id.to_string(),
        }
    })?;
    if agreement.sale_cycle != asset.sale_cycle || agreement.buyer_org != *buyer_org {
        tracing::debug!(
            asset_id,
            buyer = %buyer_org,
            intent_cycle = agreement.sale_cycle,
            current_cycle = asset.sale_cycle,
            "transfer agreement is from an earlier sale"
        );
        return Err(missing());
    }

    let buyer_collection = CollectionId::private(buyer_org);
    let buyer_hash = ctx
        .private_data_hash(&buyer_collection, &price_agreement_key(asset_id))
        .map_err(|e| e.for_asset(asset_id))?
        .ok_or_else(missing)?;

    if !buyer_hash.ct_eq(&committed) {
        tracing::info!(asset_id, buyer = %buyer_org, "price agreement hash mismatch");
        return Err(ContractError::PriceMismatch {
            asset_id: asset_id.to_string(),
        });
    }

    Ok(TransferAuthorization {
        agreement,
        grant: WriteGrant::new(buyer_collection),
    })
}
