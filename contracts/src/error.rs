//! # Contract Errors
//!
//! The error surface callers see. Every variant names the asset involved.
//! Input errors are raised before any state is read, authorization and
//! state errors before any write is buffered, and consistency errors
//! (`AgreementMissing`, `PriceMismatch`) are expected outcomes the caller
//! can fix and resubmit.

use thiserror::Error;

use tessera_protocol::storage::StoreError;

/// Errors returned by asset-transfer operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContractError {
    /// An asset with this ID is already on the ledger.
    #[error("asset {asset_id} already exists")]
    AlreadyExists { asset_id: String },

    /// No asset with this ID, or no record of the requested kind.
    #[error("asset {asset_id} does not exist")]
    NotFound { asset_id: String },

    /// The caller's organization may not perform this operation.
    #[error("caller is not authorized for asset {asset_id}")]
    Unauthorized { asset_id: String },

    /// The asset is not in a state that allows this operation.
    #[error("asset {asset_id} is {current}, expected {expected}")]
    InvalidState {
        asset_id: String,
        /// The asset's current state.
        current: String,
        /// The state(s) required for this operation.
        expected: String,
    },

    /// The named buyer has not agreed to purchase this asset.
    #[error("no transfer agreement from {buyer_org} for asset {asset_id}")]
    AgreementMissing { asset_id: String, buyer_org: String },

    /// The buyer's agreed price does not match the seller's commitment.
    #[error("price agreement for asset {asset_id} does not match the committed price")]
    PriceMismatch { asset_id: String },

    /// The transient payload or arguments are malformed.
    #[error("invalid payload for asset {asset_id}: {reason}")]
    InvalidPayload { asset_id: String, reason: String },

    /// The storage backend failed. Details stay in the peer's logs.
    #[error("ledger unavailable while processing asset {asset_id}")]
    Ledger { asset_id: String },
}

impl ContractError {
    /// Stable error code for wire responses.
    pub fn kind(&self) -> &'static str {
        match self {
            ContractError::AlreadyExists { .. } => "AlreadyExists",
            ContractError::NotFound { .. } => "NotFound",
            ContractError::Unauthorized { .. } => "Unauthorized",
            ContractError::InvalidState { .. } => "InvalidState",
            ContractError::AgreementMissing { .. } => "AgreementMissing",
            ContractError::PriceMismatch { .. } => "PriceMismatch",
            ContractError::InvalidPayload { .. } => "InvalidPayload",
            ContractError::Ledger { .. } => "Ledger",
        }
    }

    /// The asset this error concerns.
    pub fn asset_id(&self) -> &str {
        match self {
            ContractError::AlreadyExists { asset_id }
            | ContractError::NotFound { asset_id }
            | ContractError::Unauthorized { asset_id }
            | ContractError::InvalidState { asset_id, .. }
            | ContractError::AgreementMissing { asset_id, .. }
            | ContractError::PriceMismatch { asset_id }
            | ContractError::InvalidPayload { asset_id, .. }
            | ContractError::Ledger { asset_id } => asset_id,
        }
    }

    pub(crate) fn invalid_payload(asset_id: &str, reason: impl Into<String>) -> Self {
        ContractError::InvalidPayload {
            asset_id: asset_id.to_string(),
            reason: reason.into(),
        }
    }

    /// Convert a storage fault. The underlying error is logged here and
    /// never crosses the organizational boundary.
    pub(crate) fn ledger(asset_id: &str, err: StoreError) -> Self {
        tracing::error!(asset_id, error = %err, "storage failure");
        ContractError::Ledger {
            asset_id: asset_id.to_string(),
        }
    }
}

/// Errors raised while turning a named request into an operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvocationError {
    /// The operation name is not part of this contract.
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl InvocationError {
    pub fn kind(&self) -> &'static str {
        match self {
            InvocationError::UnknownOperation(_) => "UnknownOperation",
            InvocationError::Contract(e) => e.kind(),
        }
    }
}
