// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Tessera Protocol — Ledger Substrate
//!
//! Tessera tracks ownership of discrete assets on a ledger shared by
//! organizations that do not trust each other. Each asset has a public
//! record everyone can read and private detail that only the owning
//! organization may see. This crate is the substrate the asset contract
//! runs on:
//!
//! - **identity** — `(organization, user)` pairs as vouched for by the
//!   membership service. We trust them; we do not verify certificates.
//! - **crypto** — SHA-256/BLAKE3 wrappers and canonical-JSON commitments.
//! - **storage** — collection-partitioned key-value storage with atomic
//!   write sets, over memory or sled.
//! - **config** — collection names, transient keys, limits.
//!
//! ## Design Philosophy
//!
//! 1. A private collection is a wall, not a naming convention.
//! 2. Commitments are computed over canonical bytes, so "same terms" means
//!    the same digest regardless of who serialized them.
//! 3. Nothing is written until everything is ready to be written.

pub mod config;
pub mod crypto;
pub mod identity;
pub mod storage;
