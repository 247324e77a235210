//! Review-event repository: append-only audit history per indexed note.
//!
//! # Responsibility
//! - Append review events and expose the latest event per note.
//!
//! # Invariants
//! - Events are never mutated or deleted by core code; deleting the
//!   owning `ilms` row cascades via the foreign key.
//! - "Latest" is ordered by `update_date`, surrogate id as tiebreak, so
//!   same-timestamp events resolve deterministically.

use super::ilm_repo::{format_date, format_datetime, parse_date, parse_datetime, RepoError, RepoResult};
use crate::model::review::ReviewEvent;
use rusqlite::{params, Connection, OptionalExtension, Row};

/// Repository interface for the append-only review history.
pub trait ReviewRepository {
    fn append(&self, ilm_id: &str, event: &ReviewEvent) -> RepoResult<()>;
    fn latest(&self, ilm_id: &str) -> RepoResult<Option<ReviewEvent>>;
    fn count_for(&self, ilm_id: &str) -> RepoResult<usize>;
}

/// SQLite-backed review-event repository.
pub struct SqliteReviewRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReviewRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ReviewRepository for SqliteReviewRepository<'_> {
    fn append(&self, ilm_id: &str, event: &ReviewEvent) -> RepoResult<()> {
        let changed = self.conn.execute(
            "INSERT INTO reviews (
                ilm_ref,
                update_date,
                review_date,
                reviewed,
                score,
                multiplier,
                next_review_date
            )
            SELECT id, ?2, ?3, ?4, ?5, ?6, ?7
            FROM ilms
            WHERE ilm_id = ?1;",
            params![
                ilm_id,
                format_datetime(event.update_date),
                format_date(event.review_date),
                event.reviewed,
                event.score,
                event.multiplier,
                format_date(event.next_review_date),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(ilm_id.to_string()));
        }

        Ok(())
    }

    fn latest(&self, ilm_id: &str) -> RepoResult<Option<ReviewEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                r.update_date,
                r.review_date,
                r.reviewed,
                r.score,
                r.multiplier,
                r.next_review_date
            FROM reviews r
            JOIN ilms i ON i.id = r.ilm_ref
            WHERE i.ilm_id = ?1
            ORDER BY r.update_date DESC, r.id DESC
            LIMIT 1;",
        )?;

        stmt.query_row([ilm_id], parse_event_row)
            .optional()?
            .transpose()
    }

    fn count_for(&self, ilm_id: &str) -> RepoResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*)
             FROM reviews r
             JOIN ilms i ON i.id = r.ilm_ref
             WHERE i.ilm_id = ?1;",
            [ilm_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

fn parse_event_row(row: &Row<'_>) -> rusqlite::Result<RepoResult<ReviewEvent>> {
    let update_text: String = row.get("update_date")?;
    let review_text: String = row.get("review_date")?;
    let next_text: String = row.get("next_review_date")?;

    let Some(update_date) = parse_datetime(&update_text) else {
        return Ok(Err(RepoError::InvalidData(format!(
            "invalid datetime `{update_text}` in reviews.update_date"
        ))));
    };
    let Some(review_date) = parse_date(&review_text) else {
        return Ok(Err(RepoError::InvalidData(format!(
            "invalid date `{review_text}` in reviews.review_date"
        ))));
    };
    let Some(next_review_date) = parse_date(&next_text) else {
        return Ok(Err(RepoError::InvalidData(format!(
            "invalid date `{next_text}` in reviews.next_review_date"
        ))));
    };

    Ok(Ok(ReviewEvent {
        update_date,
        review_date,
        reviewed: row.get("reviewed")?,
        score: row.get("score")?,
        multiplier: row.get("multiplier")?,
        next_review_date,
    }))
}
