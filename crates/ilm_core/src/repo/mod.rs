//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for the index.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes must enforce `Ilm::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `PathConflict`)
//!   in addition to DB transport errors.

pub mod ilm_repo;
pub mod review_repo;

pub use ilm_repo::{IlmRepository, RepoError, RepoResult, SqliteIlmRepository};
pub use review_repo::{ReviewRepository, SqliteReviewRepository};
