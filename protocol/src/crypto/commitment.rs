//! # Price Commitments over Canonical JSON
//!
//! A commitment is `SHA-256(canonical_json(payload))`. Canonical JSON here
//! means: object keys sorted lexicographically at every depth, no
//! insignificant whitespace. Two payloads that differ only in field order
//! produce the same commitment; payloads that differ in any attribute do not.
//!
//! ```text
//! seller:  agreed_price_hash = commit({"assetID":"asset1","proposedPrice":100})
//! buyer:   stores canonical({"proposedPrice":100,"assetID":"asset1"}) privately
//! verify:  sha256(buyer's stored bytes) == agreed_price_hash
//! ```
//!
//! The last line is why private records are always stored in canonical form:
//! the digest of the stored bytes *is* the commitment, so a third party can
//! compare digests without ever reading the preimage.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

use super::hash::sha256_array;
use crate::config::COMMITMENT_LENGTH;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced by the commitment engine. Hashing itself cannot fail;
/// only decoding the payload can.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommitmentError {
    /// The payload is not a well-formed JSON document.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

// ---------------------------------------------------------------------------
// Commitment
// ---------------------------------------------------------------------------

/// A 32-byte SHA-256 commitment. Serialized as lowercase hex so it reads
/// the same in JSON records and log lines.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Commitment([u8; COMMITMENT_LENGTH]);

impl Commitment {
    /// Wrap a raw digest.
    pub fn from_bytes(bytes: [u8; COMMITMENT_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Digest of bytes that are already in canonical form, such as a record
    /// read back from a collection.
    pub fn of_stored(bytes: &[u8]) -> Self {
        Self(sha256_array(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; COMMITMENT_LENGTH] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a hex-encoded commitment.
    pub fn from_hex(s: &str) -> Result<Self, CommitmentError> {
        let bytes = hex::decode(s).map_err(|e| CommitmentError::InvalidPayload(e.to_string()))?;
        let arr: [u8; COMMITMENT_LENGTH] = bytes.try_into().map_err(|v: Vec<u8>| {
            CommitmentError::InvalidPayload(format!(
                "commitment must be {} bytes, got {}",
                COMMITMENT_LENGTH,
                v.len()
            ))
        })?;
        Ok(Self(arr))
    }

    /// Compare without short-circuiting on the first differing byte.
    pub fn ct_eq(&self, other: &Commitment) -> bool {
        self.0
            .iter()
            .zip(other.0.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl std::fmt::Debug for Commitment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Commitment({})", self.to_hex())
    }
}

impl std::fmt::Display for Commitment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Commitment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Commitment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Commitment::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Canonical encoding
// ---------------------------------------------------------------------------

/// Rebuild a JSON value with object keys in sorted order at every depth.
///
/// serde_json's default `Map` is already a `BTreeMap`, but the
/// `preserve_order` feature can be switched on by any crate in the build
/// graph. Sorting explicitly keeps the encoding stable either way.
fn sorted(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut out = Map::new();
            for (k, v) in entries {
                out.insert(k, sorted(v));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sorted).collect()),
        other => other,
    }
}

/// Decode a JSON payload and re-encode it canonically.
pub fn canonicalize(payload: &[u8]) -> Result<Vec<u8>, CommitmentError> {
    if payload.is_empty() {
        return Err(CommitmentError::InvalidPayload("empty payload".into()));
    }
    let value: Value = serde_json::from_slice(payload)
        .map_err(|e| CommitmentError::InvalidPayload(e.to_string()))?;
    serde_json::to_vec(&sorted(value)).map_err(|e| CommitmentError::InvalidPayload(e.to_string()))
}

/// Canonical bytes of any serializable value.
pub fn canonical_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, CommitmentError> {
    let value =
        serde_json::to_value(value).map_err(|e| CommitmentError::InvalidPayload(e.to_string()))?;
    serde_json::to_vec(&sorted(value)).map_err(|e| CommitmentError::InvalidPayload(e.to_string()))
}

// ---------------------------------------------------------------------------
// Commit / verify
// ---------------------------------------------------------------------------

/// Commit to a raw JSON payload.
///
/// # Errors
///
/// Returns [`CommitmentError::InvalidPayload`] if the payload is empty or
/// not valid JSON. No digest is produced in that case.
pub fn commit(payload: &[u8]) -> Result<Commitment, CommitmentError> {
    let canonical = canonicalize(payload)?;
    Ok(Commitment(sha256_array(&canonical)))
}

/// Commit to a typed value via its canonical JSON encoding.
pub fn commit_value<T: Serialize>(value: &T) -> Result<Commitment, CommitmentError> {
    let canonical = canonical_bytes(value)?;
    Ok(Commitment(sha256_array(&canonical)))
}

/// Recompute the commitment of `payload` and compare it to `expected`.
pub fn verify(payload: &[u8], expected: &Commitment) -> Result<bool, CommitmentError> {
    let actual = commit(payload)?;
    Ok(actual.ct_eq(expected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn commit_is_deterministic() {
        let payload = br#"{"assetID":"asset1","proposedPrice":100}"#;
        assert_eq!(commit(payload).unwrap(), commit(payload).unwrap());
    }

    #[test]
    fn field_order_does_not_matter() {
        let a = br#"{"assetID":"asset1","proposedPrice":100}"#;
        let b = br#"{ "proposedPrice": 100, "assetID": "asset1" }"#;
        assert_eq!(commit(a).unwrap(), commit(b).unwrap());
    }

    #[test]
    fn nested_objects_are_sorted() {
        let a = br#"{"outer":{"b":1,"a":2},"z":[{"y":1,"x":2}]}"#;
        let b = br#"{"z":[{"x":2,"y":1}],"outer":{"a":2,"b":1}}"#;
        assert_eq!(canonicalize(a).unwrap(), canonicalize(b).unwrap());
    }

    #[test]
    fn different_prices_differ() {
        let a = br#"{"assetID":"asset1","proposedPrice":100}"#;
        let b = br#"{"assetID":"asset1","proposedPrice":90}"#;
        assert_ne!(commit(a).unwrap(), commit(b).unwrap());
    }

    #[test]
    fn malformed_payload_rejected() {
        assert!(matches!(
            commit(b"{not json"),
            Err(CommitmentError::InvalidPayload(_))
        ));
        assert!(matches!(commit(b""), Err(CommitmentError::InvalidPayload(_))));
    }

    #[test]
    fn verify_round_trip() {
        let payload = br#"{"assetID":"asset1","proposedPrice":100}"#;
        let c = commit(payload).unwrap();
        assert!(verify(payload, &c).unwrap());
        assert!(!verify(br#"{"assetID":"asset1","proposedPrice":101}"#, &c).unwrap());
    }

    #[test]
    fn typed_and_raw_commitments_agree() {
        let value = json!({ "proposedPrice": 100, "assetID": "asset1" });
        let raw = br#"{"assetID":"asset1","proposedPrice":100}"#;
        assert_eq!(commit_value(&value).unwrap(), commit(raw).unwrap());
    }

    #[test]
    fn stored_digest_matches_commitment() {
        let canonical = canonicalize(br#"{"proposedPrice":100,"assetID":"asset1"}"#).unwrap();
        let c = commit(&canonical).unwrap();
        assert_eq!(Commitment::of_stored(&canonical), c);
    }

    #[test]
    fn hex_serde() {
        let c = commit(b"{}").unwrap();
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, format!("\"{}\"", c.to_hex()));
        let back: Commitment = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
        assert!(Commitment::from_hex("abcd").is_err());
    }
}
