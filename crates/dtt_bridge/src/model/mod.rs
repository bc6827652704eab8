//! Wire-level data model shared between the bridge and the application core.
//!
//! # Responsibility
//! - Define the outbound command shape and the inbound snapshot shape.
//! - Keep serde naming aligned with the core's JSON field names.
//!
//! # Invariants
//! - A `Snapshot` is produced only by the core; the bridge never merges two.
//! - Secret raw values never appear in `Debug` output.

pub mod command;
pub mod snapshot;
