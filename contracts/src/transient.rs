//! # Transient Payloads
//!
//! Sensitive inputs (private attributes, prices, buyer designations) travel
//! in a transient map that exists only for the duration of one call.
//! [`Transient`] deliberately does not implement `Serialize`, and its
//! `Debug` output lists key names and sizes but never contents, so neither
//! history nor logs can capture what was sent.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use tessera_protocol::config::{MAX_ASSET_ID_LENGTH, MAX_TRANSIENT_VALUE_BYTES};
use tessera_protocol::identity::OrgId;

use crate::error::ContractError;

/// Transient key -> raw bytes, as delivered alongside a transaction.
#[derive(Clone, Default)]
pub struct Transient {
    entries: HashMap<String, Vec<u8>>,
}

impl Transient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.entries.get(key).map(|v| v.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decode the JSON value under `key`.
    ///
    /// Failures are reported as [`ContractError::InvalidPayload`]. When the
    /// bytes are JSON with an `assetID` field, the error names that asset.
    pub fn decode<T: DeserializeOwned>(&self, key: &str) -> Result<T, ContractError> {
        let bytes = self.get(key).ok_or_else(|| {
            ContractError::invalid_payload("", format!("missing transient field {key}"))
        })?;
        if bytes.len() > MAX_TRANSIENT_VALUE_BYTES {
            return Err(ContractError::invalid_payload(
                "",
                format!(
                    "transient field {key} is {} bytes, limit is {}",
                    bytes.len(),
                    MAX_TRANSIENT_VALUE_BYTES
                ),
            ));
        }
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| ContractError::invalid_payload("", format!("{key}: {e}")))?;
        let asset_hint = value
            .get("assetID")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        serde_json::from_value(value)
            .map_err(|e| ContractError::invalid_payload(&asset_hint, format!("{key}: {e}")))
    }
}

impl std::fmt::Debug for Transient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<_> = self.entries.iter().map(|(k, v)| (k, v.len())).collect();
        keys.sort();
        f.debug_struct("Transient").field("entries", &keys).finish()
    }
}

// ---------------------------------------------------------------------------
// Payload schemas
// ---------------------------------------------------------------------------

/// `asset_properties`: full asset definition for create and update.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetProperties {
    #[serde(default)]
    pub object_type: Option<String>,
    #[serde(rename = "assetID")]
    pub asset_id: String,
    #[serde(default)]
    pub public_attributes: Map<String, Value>,
    #[serde(default)]
    pub private_detail: Map<String, Value>,
}

/// `asset_value`: a price proposal.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetValue {
    #[serde(rename = "assetID")]
    pub asset_id: String,
    #[serde(alias = "appraisedValue")]
    pub proposed_price: u64,
}

/// `asset_owner`: the buyer a transfer should go to.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetOwner {
    #[serde(rename = "assetID")]
    pub asset_id: String,
    #[serde(alias = "buyerMSP")]
    pub buyer_org: OrgId,
}

/// Reject IDs that are empty, oversized, or could alias a composite key.
pub fn validate_asset_id(asset_id: &str) -> Result<(), ContractError> {
    if asset_id.is_empty() {
        return Err(ContractError::invalid_payload(asset_id, "assetID must not be empty"));
    }
    if asset_id.len() > MAX_ASSET_ID_LENGTH {
        return Err(ContractError::invalid_payload(
            asset_id,
            format!("assetID exceeds {MAX_ASSET_ID_LENGTH} bytes"),
        ));
    }
    if asset_id.contains('\u{0}') {
        return Err(ContractError::invalid_payload(asset_id, "assetID contains NUL"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_protocol::config::TRANSIENT_ASSET_VALUE;

    #[test]
    fn decode_price() {
        let t = Transient::new().with(
            TRANSIENT_ASSET_VALUE,
            br#"{"assetID":"asset1","proposedPrice":100}"#.to_vec(),
        );
        let v: AssetValue = t.decode(TRANSIENT_ASSET_VALUE).unwrap();
        assert_eq!(v.asset_id, "asset1");
        assert_eq!(v.proposed_price, 100);
    }

    #[test]
    fn appraised_value_alias() {
        let t = Transient::new().with(
            TRANSIENT_ASSET_VALUE,
            br#"{"assetID":"asset1","appraisedValue":100}"#.to_vec(),
        );
        let v: AssetValue = t.decode(TRANSIENT_ASSET_VALUE).unwrap();
        assert_eq!(v.proposed_price, 100);
    }

    #[test]
    fn missing_field_is_invalid_payload() {
        let err = Transient::new()
            .decode::<AssetValue>(TRANSIENT_ASSET_VALUE)
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidPayload");
    }

    #[test]
    fn schema_error_names_the_asset() {
        let t = Transient::new().with(
            TRANSIENT_ASSET_VALUE,
            br#"{"assetID":"asset7","proposedPrice":"a lot"}"#.to_vec(),
        );
        let err = t.decode::<AssetValue>(TRANSIENT_ASSET_VALUE).unwrap_err();
        assert_eq!(err.asset_id(), "asset7");
    }

    #[test]
    fn oversized_value_rejected() {
        let t = Transient::new().with("k", vec![b' '; MAX_TRANSIENT_VALUE_BYTES + 1]);
        assert!(t.decode::<Value>("k").is_err());
    }

    #[test]
    fn debug_hides_contents() {
        let t = Transient::new().with("asset_value", b"{\"proposedPrice\":12345}".to_vec());
        let shown = format!("{t:?}");
        assert!(shown.contains("asset_value"));
        assert!(!shown.contains("12345"));
    }

    #[test]
    fn asset_id_rules() {
        assert!(validate_asset_id("asset1").is_ok());
        assert!(validate_asset_id("").is_err());
        assert!(validate_asset_id("a\u{0}b").is_err());
        assert!(validate_asset_id(&"x".repeat(MAX_ASSET_ID_LENGTH + 1)).is_err());
    }
}
