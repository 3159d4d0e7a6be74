//! # Protocol Configuration & Constants
//!
//! Every collection name, transient key, and payload limit in Tessera lives
//! here. Contracts and the node import these rather than repeating string
//! literals, because a typo in a collection name is a silent data leak
//! waiting to happen.

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// The full protocol version string.
pub const PROTOCOL_VERSION: &str = "0.1.0";

/// Name of the contract this protocol version ships with. Recorded in
/// every history entry so replays know which ruleset produced a write.
pub const CONTRACT_NAME: &str = "private";

// ---------------------------------------------------------------------------
// Collection Topology
// ---------------------------------------------------------------------------

/// The shared collection readable by every ledger participant. Public asset
/// records and transfer agreements live here.
pub const SHARED_COLLECTION_NAME: &str = "assetCollection";

/// Suffix appended to an organization's MSP ID to form the name of its
/// private collection, e.g. `Org1MSP` -> `Org1MSPPrivateCollection`.
pub const PRIVATE_COLLECTION_SUFFIX: &str = "PrivateCollection";

// ---------------------------------------------------------------------------
// Object Types
// ---------------------------------------------------------------------------

/// Default object type tag for assets created without an explicit type.
pub const DEFAULT_ASSET_OBJECT_TYPE: &str = "ValuableAsset";

/// Key prefix for transfer agreements in the shared collection. The NUL
/// separators keep composite keys from colliding with plain asset IDs.
pub const TRANSFER_AGREEMENT_PREFIX: &str = "transferAgreement";

/// Key prefix for a buyer's price agreement inside its own private
/// collection. Kept apart from the plain asset ID, which is where the
/// authoritative private detail lands once the transfer completes.
pub const PRICE_AGREEMENT_PREFIX: &str = "priceAgreement";

// ---------------------------------------------------------------------------
// Transient Map Keys
// ---------------------------------------------------------------------------

/// Transient key carrying the full asset definition for create/update.
pub const TRANSIENT_ASSET_PROPERTIES: &str = "asset_properties";

/// Transient key carrying a price proposal for `AgreeToTransfer`.
pub const TRANSIENT_ASSET_VALUE: &str = "asset_value";

/// Transient key carrying the buyer designation for `TransferAsset`.
pub const TRANSIENT_ASSET_OWNER: &str = "asset_owner";

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Maximum size of a single transient value in bytes. Transient payloads
/// are held in memory for the duration of one call; 64 KiB is far beyond
/// any legitimate asset description.
pub const MAX_TRANSIENT_VALUE_BYTES: usize = 64 * 1024;

/// Maximum length of an asset identifier.
pub const MAX_ASSET_ID_LENGTH: usize = 128;

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

/// BLAKE3 derive-key context for transaction IDs.
pub const TX_ID_DOMAIN: &str = "tessera 2026-01 transaction id";

/// Commitment digest length in bytes (SHA-256).
pub const COMMITMENT_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Node Defaults
// ---------------------------------------------------------------------------

/// Default port for the submit/evaluate HTTP API.
pub const DEFAULT_API_PORT: u16 = 7051;

/// Default metrics (Prometheus) port.
pub const DEFAULT_METRICS_PORT: u16 = 9443;

/// Returns the private collection name for an organization MSP ID.
pub fn private_collection_name(msp_id: &str) -> String {
    format!("{}{}", msp_id, PRIVATE_COLLECTION_SUFFIX)
}
