//! # Tessera Asset-Transfer Contract
//!
//! Ownership transfer of assets whose sensitive detail lives in
//! per-organization private collections. A sale goes through three steps:
//!
//! 1. The seller commits the SHA-256 of its asking price to the public
//!    record (`AgreeToTransfer` by the owner).
//! 2. The buyer stores the same price in its own collection and publishes a
//!    price-free intent (`AgreeToTransfer` by anyone else).
//! 3. The seller calls `TransferAsset`. The contract compares the hash of
//!    the buyer's stored agreement with the seller's commitment and, if they
//!    match, moves ownership and the private detail in one write set.
//!
//! Neither side ever sees the other's figure before the transfer. A
//! mismatch is reported as `PriceMismatch` and changes nothing.
//!
//! ## Layout
//!
//! - [`asset`] — records and key layout.
//! - [`transient`] — the non-persisted payload channel and its schemas.
//! - [`context`] — per-call ledger view with collection capability checks.
//! - [`authorization`] — ownership, state and transfer checks.
//! - [`operations`] / [`query`] — the mutating and read-only operations.
//! - [`dispatch`] — named requests to a closed [`Operation`] enum.
//! - [`ledger`] — [`AssetLedger`]: locking, submit/evaluate, history.

pub mod asset;
pub mod authorization;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod ledger;
pub mod operations;
pub mod query;
pub mod transient;

pub use asset::{Asset, AssetState, PriceAgreement, PrivateDetail, TransferAgreement};
pub use dispatch::{Operation, Response};
pub use error::{ContractError, InvocationError};
pub use ledger::AssetLedger;
pub use transient::Transient;
