//! Core engine for the ilm spaced-repetition note pipeline.
//! This crate is the single source of truth for scheduling invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod note;
pub mod repo;
pub mod service;

pub use config::{Config, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::ilm::{generate_ilm_id, Ilm, IlmValidationError};
pub use model::review::{classify, ReviewEvent, ReviewState};
pub use note::{NoteError, NoteFile};
pub use repo::{
    IlmRepository, RepoError, RepoResult, ReviewRepository, SqliteIlmRepository,
    SqliteReviewRepository,
};
pub use service::{
    run_pipeline, AllocationReport, Indexer, PipelineReport, PriorityAllocator, ProcessReport,
    ReviewProcessor, ServiceError, SyncReport,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
