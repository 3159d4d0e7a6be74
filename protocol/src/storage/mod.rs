//! # Storage Module
//!
//! Partitioned key-value storage for the Tessera ledger.
//!
//! ## Architecture
//!
//! ```text
//! collection.rs — CollectionId, WriteSet, the CollectionStore trait
//! memory.rs     — MemoryStore: in-process backend for tests and --in-memory nodes
//! db.rs         — SledStore: one sled tree per collection plus a history tree
//! history.rs    — TransactionRecord: durable log of committed submissions
//! ```
//!
//! ## Partitioning
//!
//! Every read and write names a [`CollectionId`]. Backends keep each
//! collection in its own keyspace (a separate map, a separate sled tree), so
//! the same key written to two collections yields two unrelated records and
//! no read path can reach across. Who may *ask* for which collection is the
//! contract layer's business; this layer guarantees the walls exist.
//!
//! ## Atomicity
//!
//! Contracts never write directly. They accumulate a [`WriteSet`] and hand
//! it to [`CollectionStore::commit`], which applies every public write,
//! every private write, and the history record as one unit.

pub mod collection;
pub mod db;
pub mod history;
pub mod memory;

pub use collection::{CollectionId, CollectionStore, StoreError, StoreResult, WriteSet};
pub use db::SledStore;
pub use history::TransactionRecord;
pub use memory::MemoryStore;
