//! Domain model for indexed notes and review history.
//!
//! # Responsibility
//! - Define the canonical records mirrored between note files and SQLite.
//! - Define the pure review-state classification used by scheduling.
//!
//! # Invariants
//! - Every indexed note is identified by a stable short `ilm` id.
//! - Persisted scores are positive and multipliers are above one.

pub mod ilm;
pub mod review;
