//! Repository layer for activities.
//!
//! # Responsibility
//! - Define the data access contract callers use for activities.
//! - Keep storage and latency details out of caller code.
//!
//! # Invariants
//! - Id-keyed lookups return semantic `NotFound` errors.
//! - Malformed identifiers are rejected at the boundary as `InvalidArgument`.

pub mod activity_repo;
