//! # Asset Lifecycle Operations
//!
//! The mutating half of the contract. Each function runs inside a
//! [`TxContext`], validates its input first, checks ownership and state
//! second, and only then buffers writes. Nothing reaches the store until the
//! ledger commits the context's write set, so an early `?` leaves no trace.

use serde::de::DeserializeOwned;
use serde::Serialize;

use tessera_protocol::config::DEFAULT_ASSET_OBJECT_TYPE;
use tessera_protocol::crypto::{canonical_bytes, commit_value};
use tessera_protocol::storage::CollectionId;

use crate::asset::{
    price_agreement_key, transfer_agreement_key, transfer_agreements_prefix, Asset, AssetState,
    PriceAgreement, PrivateDetail, TransferAgreement,
};
use crate::authorization::{authorize_transfer, ensure_owner, ensure_state};
use crate::context::TxContext;
use crate::error::ContractError;
use crate::transient::{validate_asset_id, AssetOwner, AssetProperties, AssetValue};

// ---------------------------------------------------------------------------
// Record helpers
// ---------------------------------------------------------------------------

pub(crate) fn encode<T: Serialize>(asset_id: &str, value: &T) -> Result<Vec<u8>, ContractError> {
    canonical_bytes(value).map_err(|e| ContractError::invalid_payload(asset_id, e.to_string()))
}

pub(crate) fn decode<T: DeserializeOwned>(asset_id: &str, bytes: &[u8]) -> Result<T, ContractError> {
    serde_json::from_slice(bytes).map_err(|e| {
        tracing::error!(asset_id, error = %e, "stored record is unreadable");
        ContractError::Ledger {
            asset_id: asset_id.to_string(),
        }
    })
}

/// Load the public record, or `NotFound`.
pub(crate) fn load_asset(ctx: &TxContext<'_>, asset_id: &str) -> Result<Asset, ContractError> {
    let bytes = ctx
        .get_state(asset_id)
        .map_err(|e| e.for_asset(asset_id))?
        .ok_or_else(|| ContractError::NotFound {
            asset_id: asset_id.to_string(),
        })?;
    decode(asset_id, &bytes)
}

fn store_asset(ctx: &mut TxContext<'_>, asset: &Asset) -> Result<(), ContractError> {
    let bytes = encode(&asset.asset_id, asset)?;
    ctx.put_state(&asset.asset_id, bytes);
    Ok(())
}

fn store_detail(
    ctx: &mut TxContext<'_>,
    collection: &CollectionId,
    detail: &PrivateDetail,
) -> Result<(), ContractError> {
    let asset_id = detail.asset_id.as_str();
    let bytes = encode(asset_id, detail)?;
    ctx.put_private(collection, asset_id, bytes)
        .map_err(|e| e.for_asset(asset_id))
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Register a new asset owned by the caller's organization.
pub fn create_asset(ctx: &mut TxContext<'_>, props: AssetProperties) -> Result<(), ContractError> {
    let asset_id = props.asset_id.as_str();
    validate_asset_id(asset_id)?;

    let exists = ctx
        .get_state(asset_id)
        .map_err(|e| e.for_asset(asset_id))?
        .is_some();
    if exists {
        return Err(ContractError::AlreadyExists {
            asset_id: asset_id.to_string(),
        });
    }

    let caller = ctx.caller().clone();
    let asset = Asset {
        object_type: props
            .object_type
            .clone()
            .unwrap_or_else(|| DEFAULT_ASSET_OBJECT_TYPE.to_string()),
        asset_id: asset_id.to_string(),
        owner_org: caller.org.clone(),
        owner_user: caller.user.clone(),
        public_attributes: props.public_attributes.clone(),
        state: AssetState::Created,
        agreed_price_hash: None,
        sale_cycle: 0,
    };
    let detail = PrivateDetail {
        asset_id: asset_id.to_string(),
        attributes: props.private_detail,
    };

    store_asset(ctx, &asset)?;
    let own = ctx.own_collection();
    store_detail(ctx, &own, &detail)?;

    tracing::info!(asset_id, org = %caller.org, "asset created");
    Ok(())
}

/// Replace the public attributes and private detail of an owned asset.
pub fn update_asset(ctx: &mut TxContext<'_>, props: AssetProperties) -> Result<(), ContractError> {
    let asset_id = props.asset_id.as_str();
    validate_asset_id(asset_id)?;

    let mut asset = load_asset(ctx, asset_id)?;
    ensure_owner(ctx.caller(), &asset)?;
    ensure_state(&asset, AssetState::Created)?;

    if let Some(object_type) = props.object_type.clone() {
        asset.object_type = object_type;
    }
    asset.public_attributes = props.public_attributes.clone();
    let detail = PrivateDetail {
        asset_id: asset_id.to_string(),
        attributes: props.private_detail,
    };

    store_asset(ctx, &asset)?;
    let own = ctx.own_collection();
    store_detail(ctx, &own, &detail)?;

    tracing::info!(asset_id, "asset updated");
    Ok(())
}

/// Record a price for an asset.
///
/// Called by the owner, this commits the asking price on the public record
/// and moves the asset to `AgreementPending`. Called by anyone else, it
/// stores the caller's [`PriceAgreement`] in its own collection and
/// publishes a price-free [`TransferAgreement`]. An identical replay writes
/// nothing; a different price replaces the previous one.
pub fn agree_to_transfer(ctx: &mut TxContext<'_>, value: AssetValue) -> Result<(), ContractError> {
    let asset_id = value.asset_id.as_str();
    validate_asset_id(asset_id)?;

    let mut asset = load_asset(ctx, asset_id)?;
    let agreement = PriceAgreement {
        asset_id: asset_id.to_string(),
        proposed_price: value.proposed_price,
    };
    let caller = ctx.caller().clone();

    if caller.org == asset.owner_org {
        let hash = commit_value(&agreement)
            .map_err(|e| ContractError::invalid_payload(asset_id, e.to_string()))?;
        if asset.state == AssetState::AgreementPending && asset.agreed_price_hash == Some(hash) {
            tracing::debug!(asset_id, "asking price unchanged");
            return Ok(());
        }
        asset.agreed_price_hash = Some(hash);
        asset.state = AssetState::AgreementPending;
        store_asset(ctx, &asset)?;
        tracing::info!(asset_id, hash = %hash, "asking price committed");
        return Ok(());
    }

    let own = ctx.own_collection();
    let key = price_agreement_key(asset_id);
    let bytes = encode(asset_id, &agreement)?;
    let current = ctx.get_private(&own, &key).map_err(|e| e.for_asset(asset_id))?;
    if current.as_deref() != Some(bytes.as_slice()) {
        ctx.put_private(&own, &key, bytes)
            .map_err(|e| e.for_asset(asset_id))?;
    }

    let intent = TransferAgreement {
        asset_id: asset_id.to_string(),
        buyer_org: caller.org.clone(),
        buyer_user: caller.user.clone(),
        sale_cycle: asset.sale_cycle,
    };
    let intent_key = transfer_agreement_key(asset_id, &caller.org);
    let intent_bytes = encode(asset_id, &intent)?;
    let published = ctx
        .get_state(&intent_key)
        .map_err(|e| e.for_asset(asset_id))?;
    if published.as_deref() != Some(intent_bytes.as_slice()) {
        ctx.put_state(&intent_key, intent_bytes);
    }

    tracing::info!(asset_id, buyer = %caller.org, "buyer agreement recorded");
    Ok(())
}

/// Move an asset and its private detail to the buyer named in `owner`.
pub fn transfer_asset(ctx: &mut TxContext<'_>, owner: AssetOwner) -> Result<(), ContractError> {
    let asset_id = owner.asset_id.as_str();
    validate_asset_id(asset_id)?;

    let mut asset = load_asset(ctx, asset_id)?;
    let auth = authorize_transfer(ctx, &asset, &owner.buyer_org)?;
    let buyer_collection = auth.grant.collection().clone();
    ctx.accept_grant(auth.grant);

    let seller_collection = ctx.own_collection();
    let detail = ctx
        .get_private(&seller_collection, asset_id)
        .map_err(|e| e.for_asset(asset_id))?
        .ok_or_else(|| {
            tracing::warn!(asset_id, "owner holds no private detail");
            ContractError::NotFound {
                asset_id: asset_id.to_string(),
            }
        })?;

    ctx.put_private(&buyer_collection, asset_id, detail)
        .map_err(|e| e.for_asset(asset_id))?;
    ctx.del_private(&seller_collection, asset_id)
        .map_err(|e| e.for_asset(asset_id))?;
    ctx.del_private(&buyer_collection, &price_agreement_key(asset_id))
        .map_err(|e| e.for_asset(asset_id))?;

    // Every buyer's intent ends with this sale, not just the winner's.
    let intents = ctx
        .scan_state(&transfer_agreements_prefix(asset_id))
        .map_err(|e| e.for_asset(asset_id))?;
    for (key, _) in &intents {
        ctx.del_state(key);
    }

    let seller = std::mem::replace(&mut asset.owner_org, owner.buyer_org.clone());
    asset.owner_user = auth.agreement.buyer_user;
    asset.agreed_price_hash = None;
    asset.state = AssetState::Created;
    asset.sale_cycle += 1;
    store_asset(ctx, &asset)?;

    tracing::info!(
        asset_id,
        from = %seller,
        to = %asset.owner_org,
        withdrawn_intents = intents.len(),
        "asset transferred"
    );
    Ok(())
}

/// Withdraw a committed asking price.
pub fn cancel_agreement(ctx: &mut TxContext<'_>, asset_id: &str) -> Result<(), ContractError> {
    validate_asset_id(asset_id)?;

    let mut asset = load_asset(ctx, asset_id)?;
    ensure_owner(ctx.caller(), &asset)?;
    ensure_state(&asset, AssetState::AgreementPending)?;

    asset.agreed_price_hash = None;
    asset.state = AssetState::Created;
    store_asset(ctx, &asset)?;

    tracing::info!(asset_id, "agreement cancelled");
    Ok(())
}
