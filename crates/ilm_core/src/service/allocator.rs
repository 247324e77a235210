//! Daily priority allocation for notes due today.
//!
//! # Responsibility
//! - Draw a score-weighted random priority split over today's queue and
//!   write it into each due note.
//! - Clear stale priorities from notes no longer due.
//!
//! # Invariants
//! - Written priorities lie in [0, 100] and sum to ~100 (2-decimal
//!   rounding aside).
//! - The Dirichlet draw is the only source of nondeterminism; the rng is
//!   injected so tests can pin exact outputs.
//! - Per-file read and write failures are logged and skipped; they never
//!   abort the step.

use crate::note::NoteFile;
use crate::repo::{IlmRepository, SqliteIlmRepository};
use crate::service::{ServiceError, ServiceResult};
use chrono::NaiveDate;
use log::{info, warn};
use rand::Rng;
use rand_distr::{Dirichlet, Distribution};
use rusqlite::Connection;
use std::path::Path;

/// Counters summarizing one allocation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocationReport {
    /// Notes due today that received a priority.
    pub allocated: usize,
    /// Notes no longer due whose stale priority was cleared.
    pub cleared: usize,
}

/// Assigns randomized score-weighted priorities to today's queue.
#[derive(Debug, Default)]
pub struct PriorityAllocator;

impl PriorityAllocator {
    pub fn new() -> Self {
        Self
    }

    /// Allocates priorities among notes due on `today` and clears stale
    /// priority fields everywhere else.
    pub fn update<R: Rng + ?Sized>(
        &self,
        conn: &Connection,
        today: NaiveDate,
        rng: &mut R,
    ) -> ServiceResult<AllocationReport> {
        info!("event=priority_update module=allocator status=start");
        let repo = SqliteIlmRepository::new(conn);
        let mut report = AllocationReport::default();

        // Yesterday's priorities must never survive into a day the note is
        // not due, so sweep them before allocating.
        for ilm in repo.list()? {
            if ilm.review_date == today {
                continue;
            }
            let path = Path::new(&ilm.path);
            let mut note = match NoteFile::read(path) {
                Ok(note) => note,
                Err(err) => {
                    warn!(
                        "event=priority_clear module=allocator status=skip path={} error={err}",
                        path.display()
                    );
                    continue;
                }
            };
            if note.remove("priority").is_some() {
                if let Err(err) = note.write(path) {
                    warn!(
                        "event=priority_clear module=allocator status=skip path={} error={err}",
                        path.display()
                    );
                    continue;
                }
                report.cleared += 1;
            }
        }

        let due = repo.due_on(today)?;
        if due.is_empty() {
            info!("event=priority_update module=allocator status=ok due=0");
            return Ok(report);
        }

        let priorities = if due.len() == 1 {
            vec![100.0]
        } else {
            let scores: Vec<f64> = due.iter().map(|ilm| ilm.score).collect();
            let dirichlet = Dirichlet::new(&scores)
                .map_err(|err| ServiceError::Allocation(err.to_string()))?;
            dirichlet
                .sample(rng)
                .into_iter()
                .map(|share| round_percent(share * 100.0))
                .collect()
        };

        for (ilm, priority) in due.iter().zip(&priorities) {
            let path = Path::new(&ilm.path);
            let mut note = match NoteFile::read(path) {
                Ok(note) => note,
                Err(err) => {
                    warn!(
                        "event=priority_assign module=allocator status=skip path={} error={err}",
                        path.display()
                    );
                    continue;
                }
            };
            note.set_f64("priority", *priority);
            if let Err(err) = note.write(path) {
                warn!(
                    "event=priority_assign module=allocator status=skip path={} error={err}",
                    path.display()
                );
                continue;
            }
            report.allocated += 1;
        }

        info!(
            "event=priority_update module=allocator status=ok due={} cleared={}",
            report.allocated, report.cleared
        );
        Ok(report)
    }
}

/// Rounds a percentage to two decimal places.
fn round_percent(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
