//! Journal domain model.
//!
//! # Responsibility
//! - Define the persisted journal entry and the grouped read model.
//!
//! # Invariants
//! - Every entry is identified by a stable `EntryId`.
//! - Derived date fields are replaced only as a whole (`DateKeys`).
//! - Deletion is a hard delete; there are no tombstones.

pub mod entry;
pub mod group;
