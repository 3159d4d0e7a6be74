//! # Identity Module
//!
//! Callers arrive already authenticated: the membership service vouches
//! for an `(organization, user)` pair and the ledger trusts it as given.
//! This module only gives that pair a type, so an organization ID can never
//! be passed where a user ID was expected.
//!
//! Enrollment, certificates, and wallets live outside Tessera.

pub mod msp;

pub use msp::{CallerIdentity, OrgId};
