//! # Query Service
//!
//! Read-only projections. Public reads go through the shared collection;
//! private reads go through the caller's own collection and nowhere else,
//! so collection membership is the only access rule a reader needs.

use tessera_protocol::identity::OrgId;

use crate::asset::{is_composite_key, price_agreement_key, Asset, PriceAgreement, PrivateDetail};
use crate::context::TxContext;
use crate::error::ContractError;
use crate::operations::{decode, load_asset};
use crate::transient::validate_asset_id;

/// The public record. Any participant may read it.
pub fn read_asset(ctx: &TxContext<'_>, asset_id: &str) -> Result<Asset, ContractError> {
    validate_asset_id(asset_id)?;
    load_asset(ctx, asset_id)
}

/// The caller organization's private detail for `asset_id`.
///
/// `NotFound` if the asset does not exist at all; `Unauthorized` if the
/// caller's collection holds no detail for it, which includes every
/// organization except the current owner.
///
/// The result is the state as of the private read. Public records are never
/// deleted, so an asset seen by the first read still exists at the second;
/// a transfer committed in between yields `Unauthorized` for the old owner,
/// which is what a read taken after that transfer reports.
pub fn read_private_detail(
    ctx: &TxContext<'_>,
    asset_id: &str,
) -> Result<PrivateDetail, ContractError> {
    validate_asset_id(asset_id)?;
    load_asset(ctx, asset_id)?;

    let own = ctx.own_collection();
    let bytes = ctx
        .get_private(&own, asset_id)
        .map_err(|e| e.for_asset(asset_id))?
        .ok_or_else(|| ContractError::Unauthorized {
            asset_id: asset_id.to_string(),
        })?;
    decode(asset_id, &bytes)
}

/// The caller's own pending price agreement.
pub fn read_price_agreement(
    ctx: &TxContext<'_>,
    asset_id: &str,
) -> Result<PriceAgreement, ContractError> {
    validate_asset_id(asset_id)?;
    let own = ctx.own_collection();
    let bytes = ctx
        .get_private(&own, &price_agreement_key(asset_id))
        .map_err(|e| e.for_asset(asset_id))?
        .ok_or_else(|| ContractError::NotFound {
            asset_id: asset_id.to_string(),
        })?;
    decode(asset_id, &bytes)
}

/// Every asset currently owned by `owner`, in asset-ID order.
pub fn assets_by_owner(ctx: &TxContext<'_>, owner: &OrgId) -> Result<Vec<Asset>, ContractError> {
    let entries = ctx.scan_state("").map_err(|e| e.for_asset(""))?;
    let mut assets = Vec::new();
    for (key, bytes) in entries {
        if is_composite_key(&key) {
            continue;
        }
        let asset: Asset = decode(&key, &bytes)?;
        if asset.owner_org == *owner {
            assets.push(asset);
        }
    }
    Ok(assets)
}

pub fn asset_exists(ctx: &TxContext<'_>, asset_id: &str) -> Result<bool, ContractError> {
    validate_asset_id(asset_id)?;
    Ok(ctx
        .get_state(asset_id)
        .map_err(|e| e.for_asset(asset_id))?
        .is_some())
}
