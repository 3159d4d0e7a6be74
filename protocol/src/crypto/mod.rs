//! # Cryptographic Primitives for Tessera
//!
//! Two concerns live here and nothing else:
//!
//! - **hash** — SHA-256 and BLAKE3 wrappers. SHA-256 is what collection
//!   digests and price commitments use, because every peer implementation
//!   on the network already speaks it. BLAKE3 is for our own identifiers.
//! - **commitment** — canonical-JSON price commitments. A seller publishes
//!   the digest, a buyer stores the preimage privately, and the transfer
//!   only goes through when the two agree byte for byte.
//!
//! Everything here is a thin, type-safe wrapper around audited crates.

pub mod commitment;
pub mod hash;

pub use commitment::{
    canonical_bytes, canonicalize, commit, commit_value, verify, Commitment, CommitmentError,
};
pub use hash::{blake3_hash, domain_separated_hash, sha256, sha256_array};
