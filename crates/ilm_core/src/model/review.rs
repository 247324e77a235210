//! Review-state classification.
//!
//! # Responsibility
//! - Map (today, review date, reviewed flag) to one scheduling state.
//!
//! # Invariants
//! - Classification is pure; callers supply the current date explicitly.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Scheduling state of a note relative to the current date.
///
/// The state depends on the day difference between today and the review
/// date ("delta") and on whether the user marked the note as reviewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
    /// The review date lies strictly in the past (delta > 0). Happens when
    /// a run was skipped or the note was reviewed near midnight, so the
    /// date passed without a new one being assigned yet.
    Past,
    /// The note is in today's queue (delta == 0), reviewed or not yet.
    Today,
    /// Scheduled for a future date and not reviewed (delta < 0).
    Future,
    /// Scheduled for a future date but already reviewed ahead of schedule
    /// (delta < 0, reviewed).
    Early,
}

/// Classifies a note's scheduling state for the given day.
pub fn classify(today: NaiveDate, review_date: NaiveDate, reviewed: bool) -> ReviewState {
    let delta = (today - review_date).num_days();
    if delta > 0 {
        ReviewState::Past
    } else if delta == 0 {
        ReviewState::Today
    } else if reviewed {
        ReviewState::Early
    } else {
        ReviewState::Future
    }
}

/// Review audit record, one per processed scheduling cycle.
///
/// Appended by the review processor and never mutated; the most recent
/// event per note carries the authoritative scheduling baseline in
/// `next_review_date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewEvent {
    /// Timestamp of the processing run that produced this event.
    pub update_date: NaiveDateTime,
    /// Review date of the note before this event's update.
    pub review_date: NaiveDate,
    /// Reviewed flag as observed this run.
    pub reviewed: bool,
    /// Score after this event's update.
    pub score: f64,
    /// Multiplier used for this event's interval computation.
    pub multiplier: f64,
    /// Review date decided by this event.
    pub next_review_date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn past_when_review_date_has_passed() {
        assert_eq!(classify(day(10), day(9), false), ReviewState::Past);
        // The reviewed flag does not matter once the date has passed.
        assert_eq!(classify(day(10), day(1), true), ReviewState::Past);
    }

    #[test]
    fn today_when_dates_match() {
        assert_eq!(classify(day(10), day(10), false), ReviewState::Today);
        assert_eq!(classify(day(10), day(10), true), ReviewState::Today);
    }

    #[test]
    fn future_when_scheduled_ahead_and_not_reviewed() {
        assert_eq!(classify(day(10), day(11), false), ReviewState::Future);
    }

    #[test]
    fn early_when_scheduled_ahead_but_reviewed() {
        assert_eq!(classify(day(10), day(11), true), ReviewState::Early);
    }
}
