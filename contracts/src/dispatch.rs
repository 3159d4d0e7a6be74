//! # Operation Dispatch
//!
//! Requests arrive as an operation name, a list of durable string arguments
//! and a transient map. [`Operation::decode`] turns that triple into a
//! closed enum with typed payloads, and [`execute`] runs it through one
//! exhaustive match. Names outside the enum are rejected, never ignored.

use serde::Serialize;

use tessera_protocol::config::{
    TRANSIENT_ASSET_OWNER, TRANSIENT_ASSET_PROPERTIES, TRANSIENT_ASSET_VALUE,
};
use tessera_protocol::identity::OrgId;

use crate::asset::{Asset, PriceAgreement, PrivateDetail};
use crate::context::TxContext;
use crate::error::{ContractError, InvocationError};
use crate::operations;
use crate::query;
use crate::transient::{AssetOwner, AssetProperties, AssetValue, Transient};

/// Every operation the contract understands.
#[derive(Clone)]
pub enum Operation {
    CreateAsset(AssetProperties),
    UpdateAsset(AssetProperties),
    AgreeToTransfer(AssetValue),
    TransferAsset(AssetOwner),
    CancelAgreement { asset_id: String },
    ReadAsset { asset_id: String },
    ReadPrivateDetail { asset_id: String },
    ReadPriceAgreement { asset_id: String },
    QueryAssetsByOwner { owner: OrgId },
    AssetExists { asset_id: String },
}

impl Operation {
    /// Decode a named request.
    pub fn decode(
        name: &str,
        args: &[String],
        transient: &Transient,
    ) -> Result<Self, InvocationError> {
        let op = match name {
            "CreateAsset" => Operation::CreateAsset(transient.decode(TRANSIENT_ASSET_PROPERTIES)?),
            "UpdateAsset" => Operation::UpdateAsset(transient.decode(TRANSIENT_ASSET_PROPERTIES)?),
            "AgreeToTransfer" => Operation::AgreeToTransfer(transient.decode(TRANSIENT_ASSET_VALUE)?),
            "TransferAsset" => Operation::TransferAsset(transient.decode(TRANSIENT_ASSET_OWNER)?),
            "CancelAgreement" => Operation::CancelAgreement {
                asset_id: single_arg(name, args)?,
            },
            "ReadAsset" => Operation::ReadAsset {
                asset_id: single_arg(name, args)?,
            },
            "ReadPrivateDetail" => Operation::ReadPrivateDetail {
                asset_id: single_arg(name, args)?,
            },
            "ReadPriceAgreement" => Operation::ReadPriceAgreement {
                asset_id: single_arg(name, args)?,
            },
            "QueryAssetsByOwner" => Operation::QueryAssetsByOwner {
                owner: OrgId::new(single_arg(name, args)?),
            },
            "AssetExists" => Operation::AssetExists {
                asset_id: single_arg(name, args)?,
            },
            other => return Err(InvocationError::UnknownOperation(other.to_string())),
        };
        Ok(op)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::CreateAsset(_) => "CreateAsset",
            Operation::UpdateAsset(_) => "UpdateAsset",
            Operation::AgreeToTransfer(_) => "AgreeToTransfer",
            Operation::TransferAsset(_) => "TransferAsset",
            Operation::CancelAgreement { .. } => "CancelAgreement",
            Operation::ReadAsset { .. } => "ReadAsset",
            Operation::ReadPrivateDetail { .. } => "ReadPrivateDetail",
            Operation::ReadPriceAgreement { .. } => "ReadPriceAgreement",
            Operation::QueryAssetsByOwner { .. } => "QueryAssetsByOwner",
            Operation::AssetExists { .. } => "AssetExists",
        }
    }

    /// The asset this operation is about, if any. Used as the lock key.
    pub fn asset_id(&self) -> Option<&str> {
        match self {
            Operation::CreateAsset(p) | Operation::UpdateAsset(p) => Some(&p.asset_id),
            Operation::AgreeToTransfer(v) => Some(&v.asset_id),
            Operation::TransferAsset(o) => Some(&o.asset_id),
            Operation::CancelAgreement { asset_id }
            | Operation::ReadAsset { asset_id }
            | Operation::ReadPrivateDetail { asset_id }
            | Operation::ReadPriceAgreement { asset_id }
            | Operation::AssetExists { asset_id } => Some(asset_id),
            Operation::QueryAssetsByOwner { .. } => None,
        }
    }

    /// Arguments safe to keep in history. Transient-borne operations have
    /// none.
    pub fn durable_args(&self) -> Vec<String> {
        match self {
            Operation::CreateAsset(_)
            | Operation::UpdateAsset(_)
            | Operation::AgreeToTransfer(_)
            | Operation::TransferAsset(_) => Vec::new(),
            Operation::QueryAssetsByOwner { owner } => vec![owner.to_string()],
            Operation::CancelAgreement { asset_id }
            | Operation::ReadAsset { asset_id }
            | Operation::ReadPrivateDetail { asset_id }
            | Operation::ReadPriceAgreement { asset_id }
            | Operation::AssetExists { asset_id } => vec![asset_id.clone()],
        }
    }

    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            Operation::ReadAsset { .. }
                | Operation::ReadPrivateDetail { .. }
                | Operation::ReadPriceAgreement { .. }
                | Operation::QueryAssetsByOwner { .. }
                | Operation::AssetExists { .. }
        )
    }
}

// Payloads can carry private attributes and prices, so only the name and
// asset are shown.
impl std::fmt::Debug for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name())
            .field("asset_id", &self.asset_id())
            .finish()
    }
}

fn single_arg(name: &str, args: &[String]) -> Result<String, ContractError> {
    match args {
        [one] => Ok(one.clone()),
        _ => Err(ContractError::invalid_payload(
            args.first().map(String::as_str).unwrap_or_default(),
            format!("{name} expects 1 argument, got {}", args.len()),
        )),
    }
}

/// What an operation hands back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Empty,
    Asset(Asset),
    Assets(Vec<Asset>),
    PrivateDetail(PrivateDetail),
    PriceAgreement(PriceAgreement),
    Exists(bool),
}

/// Run one operation against a context.
pub fn execute(ctx: &mut TxContext<'_>, op: Operation) -> Result<Response, ContractError> {
    match op {
        Operation::CreateAsset(props) => {
            operations::create_asset(ctx, props).map(|_| Response::Empty)
        }
        Operation::UpdateAsset(props) => {
            operations::update_asset(ctx, props).map(|_| Response::Empty)
        }
        Operation::AgreeToTransfer(value) => {
            operations::agree_to_transfer(ctx, value).map(|_| Response::Empty)
        }
        Operation::TransferAsset(owner) => {
            operations::transfer_asset(ctx, owner).map(|_| Response::Empty)
        }
        Operation::CancelAgreement { asset_id } => {
            operations::cancel_agreement(ctx, &asset_id).map(|_| Response::Empty)
        }
        Operation::ReadAsset { asset_id } => query::read_asset(ctx, &asset_id).map(Response::Asset),
        Operation::ReadPrivateDetail { asset_id } => {
            query::read_private_detail(ctx, &asset_id).map(Response::PrivateDetail)
        }
        Operation::ReadPriceAgreement { asset_id } => {
            query::read_price_agreement(ctx, &asset_id).map(Response::PriceAgreement)
        }
        Operation::QueryAssetsByOwner { owner } => {
            query::assets_by_owner(ctx, &owner).map(Response::Assets)
        }
        Operation::AssetExists { asset_id } => {
            query::asset_exists(ctx, &asset_id).map(Response::Exists)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_names_rejected() {
        let err = Operation::decode("UpddateAsset", &[], &Transient::new()).unwrap_err();
        assert_eq!(err, InvocationError::UnknownOperation("UpddateAsset".into()));
    }

    #[test]
    fn argument_count_checked() {
        let err = Operation::decode("ReadAsset", &[], &Transient::new()).unwrap_err();
        assert_eq!(err.kind(), "InvalidPayload");
        let args = vec!["a".to_string(), "b".to_string()];
        let err = Operation::decode("ReadAsset", &args, &Transient::new()).unwrap_err();
        assert_eq!(err.kind(), "InvalidPayload");
    }

    #[test]
    fn transient_operations_keep_no_args() {
        let t = Transient::new().with(
            TRANSIENT_ASSET_VALUE,
            br#"{"assetID":"asset1","proposedPrice":100}"#.to_vec(),
        );
        let op = Operation::decode("AgreeToTransfer", &["ignored".to_string()], &t).unwrap();
        assert_eq!(op.asset_id(), Some("asset1"));
        assert!(op.durable_args().is_empty());
        assert!(!op.is_read_only());
    }

    #[test]
    fn response_shapes() {
        assert_eq!(serde_json::to_string(&Response::Empty).unwrap(), "null");
        assert_eq!(serde_json::to_string(&Response::Exists(true)).unwrap(), "true");
        assert_eq!(serde_json::to_string(&Response::Assets(vec![])).unwrap(), "[]");
    }
}
