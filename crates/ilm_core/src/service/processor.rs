//! Review detection and interval advancement.
//!
//! # Responsibility
//! - Find notes that were reviewed or whose review date has passed.
//! - Advance their review date from the scheduling baseline, bump the
//!   score, append the audit event, and clear the reviewed flag.
//!
//! # Invariants
//! - The scheduling baseline is the latest review event's resulting date,
//!   or the creation date when no event exists.
//! - Intervals never shrink below one day.
//! - Scores only grow, and only when the user actually reviewed.

use crate::model::review::{classify, ReviewEvent, ReviewState};
use crate::note::NoteFile;
use crate::repo::{
    IlmRepository, ReviewRepository, SqliteIlmRepository, SqliteReviewRepository,
};
use crate::service::ServiceResult;
use chrono::{Duration, NaiveDateTime};
use log::{info, warn};
use rusqlite::Connection;
use std::path::Path;

/// Counters summarizing one processing run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessReport {
    /// Indexed notes visited.
    pub visited: usize,
    /// Notes advanced to a new review date.
    pub processed: usize,
}

/// Advances the schedule of reviewed and overdue notes.
#[derive(Debug, Default)]
pub struct ReviewProcessor;

impl ReviewProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Visits every indexed note and advances those that were reviewed or
    /// whose review date has passed. Other notes are left untouched.
    pub fn process(&self, conn: &Connection, now: NaiveDateTime) -> ServiceResult<ProcessReport> {
        info!("event=review_process module=processor status=start");
        let ilms = SqliteIlmRepository::new(conn);
        let reviews = SqliteReviewRepository::new(conn);
        let mut report = ProcessReport::default();
        let today = now.date();

        for mut ilm in ilms.list()? {
            report.visited += 1;

            let path = Path::new(&ilm.path).to_path_buf();
            let mut note = match NoteFile::read(&path) {
                Ok(note) => note,
                Err(err) => {
                    warn!(
                        "event=review_note module=processor status=skip path={} error={err}",
                        path.display()
                    );
                    continue;
                }
            };

            let reviewed = note.get_bool("reviewed").unwrap_or(false);
            let state = classify(today, ilm.review_date, reviewed);
            // Past states are caught even without the reviewed flag, so a
            // skipped or late run still reschedules overdue notes.
            if !reviewed && state != ReviewState::Past {
                continue;
            }

            let baseline = match reviews.latest(&ilm.ilm_id)? {
                Some(event) => event.next_review_date,
                None => ilm.created_date.date(),
            };
            let elapsed = (today - baseline).num_days().max(1);
            let interval = (elapsed as f64 * ilm.multiplier).round() as i64;
            let next_review = baseline + Duration::days(interval);
            let previous_review = ilm.review_date;

            if reviewed {
                ilm.score += 1.0;
            }
            ilm.review_date = next_review;
            ilms.update(&ilm)?;

            note.set_date("review", next_review);
            note.set_f64("score", ilm.score);
            note.set_bool("reviewed", false);
            note.write(&path)?;

            reviews.append(
                &ilm.ilm_id,
                &ReviewEvent {
                    update_date: now,
                    review_date: previous_review,
                    reviewed,
                    score: ilm.score,
                    multiplier: ilm.multiplier,
                    next_review_date: next_review,
                },
            )?;

            let reason = if reviewed { "reviewed" } else { "late" };
            info!(
                "event=review_advance module=processor status=ok ilm={} reason={reason} next_review={next_review}",
                ilm.ilm_id
            );
            report.processed += 1;
        }

        info!(
            "event=review_process module=processor status=ok visited={} processed={}",
            report.visited, report.processed
        );
        Ok(report)
    }
}
