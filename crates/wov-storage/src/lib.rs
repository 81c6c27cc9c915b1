//! Two-tier persistence.
//!
//! # Tier 1: Raw Key-Value ([`KvStore`])
//!
//! Namespaced byte-level `get`/`set`/`delete`. Used by the capability
//! kernel's revoked/used-token sets, where a full query engine would be
//! overkill.
//!
//! # Tier 2: Query Engine ([`Database`])
//!
//! Full `SurrealDB`, used by `wov-repository` for entities, verbs,
//! capabilities, scheduled tasks, and session rows.
//!
//! Same API at both tiers — scaling the `SurrealDB` connection string from
//! embedded to a distributed backend is a config change, not a code change.

#![deny(unsafe_code)]

pub mod error;
pub mod kv;

#[cfg(feature = "db")]
pub mod db;

pub use error::{StorageError, StorageResult};
pub use kv::{KvStore, MemoryKvStore};

#[cfg(feature = "db")]
pub use db::Database;

#[cfg(feature = "db")]
pub use kv::SurrealKvStore;
