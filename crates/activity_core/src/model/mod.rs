//! Activity domain model.
//!
//! # Responsibility
//! - Define the record, identifiers and payload shapes used by the repository.
//! - Keep wire naming (`Id`, `type`, `contactId`) in one place.
//!
//! # Invariants
//! - Every activity is identified by a positive `ActivityId`.
//! - Timestamps are held as UTC instants and emitted in one canonical shape.

pub mod activity;
pub mod timestamp;
