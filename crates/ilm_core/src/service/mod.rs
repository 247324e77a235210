//! Pipeline services: index sync, review processing, priority allocation.
//!
//! # Responsibility
//! - Orchestrate repository and note I/O calls into the three pipeline
//!   steps and the combined scheduled run.
//!
//! # Invariants
//! - Steps run strictly in order: sync, process, update. Each commits
//!   fully before the next begins.
//! - The storage connection is released on every exit path.

use crate::config::Config;
use crate::db::{open_db, DbError};
use crate::note::NoteError;
use crate::repo::RepoError;
use chrono::NaiveDateTime;
use log::{error, info};
use rand::Rng;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod allocator;
pub mod indexer;
pub mod processor;

pub use allocator::{AllocationReport, PriorityAllocator};
pub use indexer::{Indexer, SyncReport};
pub use processor::{ProcessReport, ReviewProcessor};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Error terminating one top-level pipeline step.
#[derive(Debug)]
pub enum ServiceError {
    Db(DbError),
    Repo(RepoError),
    Note(NoteError),
    Allocation(String),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Note(err) => write!(f, "{err}"),
            Self::Allocation(message) => write!(f, "priority allocation failed: {message}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Note(err) => Some(err),
            Self::Allocation(_) => None,
        }
    }
}

impl From<DbError> for ServiceError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<NoteError> for ServiceError {
    fn from(value: NoteError) -> Self {
        Self::Note(value)
    }
}

/// Combined outcome of one scheduled run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub sync: SyncReport,
    pub process: ProcessReport,
    pub allocation: AllocationReport,
}

/// Runs the full pipeline once: sync, process, allocate.
///
/// The connection is acquired once and dropped on every exit path. A
/// failing step is logged and aborts the remaining steps; state committed
/// by earlier steps stays intact.
pub fn run_pipeline<R: Rng + ?Sized>(
    config: &Config,
    now: NaiveDateTime,
    rng: &mut R,
) -> ServiceResult<PipelineReport> {
    let conn = open_db(config.db_path())?;

    info!("event=pipeline module=service status=start");
    let result = (|| {
        let sync = Indexer::new(config).sync(&conn, now, rng)?;
        let process = ReviewProcessor::new().process(&conn, now)?;
        let allocation = PriorityAllocator::new().update(&conn, now.date(), rng)?;
        Ok(PipelineReport {
            sync,
            process,
            allocation,
        })
    })();

    match &result {
        Ok(report) => info!(
            "event=pipeline module=service status=ok created={} updated={} deleted={} processed={} allocated={}",
            report.sync.created,
            report.sync.updated,
            report.sync.deleted,
            report.process.processed,
            report.allocation.allocated
        ),
        Err(err) => error!("event=pipeline module=service status=error error={err}"),
    }

    result
}
